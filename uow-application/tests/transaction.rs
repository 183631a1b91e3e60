use anyhow::Result as AnyResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uow_application::{AppError, EXCEPTION_CODE, OperationFailure, UnitOfWorkExt};
use uow_domain::aggregate_root::AggregateRoot;
use uow_macros::{aggregate_root, domain_event};
use uow_persist::outbox::OutboxMessage;
use uow_persist::storage::InMemoryStorage;
use uow_persist::{Repository, SaveState, UnitOfWorkConfig, UnitOfWorkFactory};
use uuid::Uuid;

#[aggregate_root(auditable)]
struct Invoice {
    number: String,
}

#[domain_event(event_type = "invoice.issued")]
struct InvoiceIssued {
    invoice_id: Uuid,
    number: String,
}

fn issue(number: &str) -> Invoice {
    let mut invoice = Invoice {
        id: Uuid::new_v4(),
        created_at_utc: None,
        modified_at_utc: None,
        domain_events: Default::default(),
        number: number.into(),
    };
    let invoice_id = invoice.id;
    invoice.raise(InvoiceIssued {
        invoice_id,
        number: number.into(),
    });
    invoice
}

fn factory(storage: &Arc<InMemoryStorage>) -> UnitOfWorkFactory {
    UnitOfWorkFactory::with_standard_interceptors(storage.clone(), UnitOfWorkConfig::default())
}

#[tokio::test]
async fn successful_operation_is_committed_and_returned() -> AnyResult<()> {
    let storage = Arc::new(InMemoryStorage::new());
    let mut uow = factory(&storage).begin();
    let cancel = CancellationToken::new();
    let invoices = uow.get_repository::<Invoice>();

    let op_cancel = cancel.clone();
    let created = uow
        .execute_in_transaction(&cancel, async move {
            invoices
                .create(issue("INV-001"), &op_cancel)
                .await
                .map_err(AppError::from)
        })
        .await?;

    assert_eq!(created.number, "INV-001");
    assert!(created.domain_events().is_empty());
    assert_eq!(uow.state(), SaveState::Committed);
    assert_eq!(storage.len::<Invoice>().await, 1);

    let messages = storage.rows::<OutboxMessage>().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_type(), "invoice.issued");
    Ok(())
}

#[tokio::test]
async fn failed_operation_commits_nothing() -> AnyResult<()> {
    let storage = Arc::new(InMemoryStorage::new());
    let mut uow = factory(&storage).begin();
    let cancel = CancellationToken::new();
    let invoices = uow.get_repository::<Invoice>();

    let op_cancel = cancel.clone();
    let failure = uow
        .execute_in_transaction(&cancel, async move {
            invoices.create(issue("INV-002"), &op_cancel).await?;
            Err::<(), _>(AppError::Validation("customer is blocked".into()))
        })
        .await
        .unwrap_err();

    assert_eq!(failure.code(), EXCEPTION_CODE);
    assert_eq!(failure.message(), "validation: customer is blocked");
    assert_eq!(storage.len::<Invoice>().await, 0);
    assert_eq!(storage.len::<OutboxMessage>().await, 0);
    // 变更仍留在工作单元内，由调用方决定放弃或重试
    assert_eq!(uow.pending_changes().await, 1);
    uow.discard_changes().await;
    assert_eq!(uow.pending_changes().await, 0);
    Ok(())
}

#[tokio::test]
async fn commit_conflict_becomes_a_failure() -> AnyResult<()> {
    let storage = Arc::new(InMemoryStorage::new());
    let existing = issue("INV-003");
    storage.seed([existing.clone()]).await;

    let mut uow = factory(&storage).begin();
    let cancel = CancellationToken::new();
    let invoices = uow.get_repository::<Invoice>();

    let op_cancel = cancel.clone();
    let failure = uow
        .execute_in_transaction_unit(&cancel, async move {
            invoices.create(existing, &op_cancel).await?;
            Ok::<(), AppError>(())
        })
        .await
        .unwrap_err();

    assert_eq!(failure.code(), EXCEPTION_CODE);
    assert!(failure.message().contains("concurrency conflict"));
    assert_eq!(uow.state(), SaveState::Failed);
    assert_eq!(storage.len::<OutboxMessage>().await, 0);
    Ok(())
}

#[tokio::test]
async fn cancelled_commit_is_reported() -> AnyResult<()> {
    let storage = Arc::new(InMemoryStorage::new());
    let mut uow = factory(&storage).begin();
    let cancel = CancellationToken::new();
    let invoices = uow.get_repository::<Invoice>();
    invoices
        .create(issue("INV-004"), &CancellationToken::new())
        .await?;
    cancel.cancel();

    let failure = uow
        .execute_in_transaction_unit(&cancel, async { Ok::<(), AppError>(()) })
        .await
        .unwrap_err();

    assert_eq!(failure.message(), "domain: operation cancelled");
    assert_eq!(storage.len::<Invoice>().await, 0);
    Ok(())
}

#[test]
fn failure_serializes_code_and_message() -> AnyResult<()> {
    let failure = OperationFailure::new(EXCEPTION_CODE, "boom");
    let json = serde_json::to_value(&failure)?;
    assert_eq!(
        json,
        serde_json::json!({ "code": "Exception.Error", "message": "boom" })
    );
    Ok(())
}
