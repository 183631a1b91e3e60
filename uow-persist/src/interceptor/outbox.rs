use super::Interceptor;
use crate::change_set::{ChangeSet, PendingChange};
use crate::outbox::{DefaultOutboxConverter, OutboxConverter};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uow_domain::error::{DomainError, DomainResult};

/// 发件箱拦截器
///
/// 取出变更集中每个聚合根缓冲的全部事件（取出后缓冲清空），
/// 经转换器生成消息后为每条消息登记一次新增，与业务变更一并提交。
#[derive(Debug, Clone, Default)]
pub struct OutboxInterceptor<C = DefaultOutboxConverter> {
    converter: C,
}

impl OutboxInterceptor {
    /// 使用默认转换器
    pub fn new() -> Self {
        Self {
            converter: DefaultOutboxConverter,
        }
    }
}

impl<C: OutboxConverter> OutboxInterceptor<C> {
    pub fn with_converter(converter: C) -> Self {
        Self { converter }
    }
}

#[async_trait]
impl<C> Interceptor for OutboxInterceptor<C>
where
    C: OutboxConverter + 'static,
{
    fn name(&self) -> &str {
        "outbox"
    }

    async fn process(
        &self,
        changes: &mut ChangeSet,
        _cancel: &CancellationToken,
    ) -> DomainResult<()> {
        let mut events = Vec::new();
        for change in changes.iter_mut() {
            if let Some(buffer) = change.entry_mut().event_buffer_mut() {
                events.extend(buffer.take());
            }
        }
        if events.is_empty() {
            return Ok(());
        }

        let drained = events.len();
        let messages = self
            .converter
            .convert(events)
            .map_err(|e| DomainError::interceptor(self.name(), e.to_string()))?;
        let staged = messages.len();
        for message in messages {
            changes.stage(PendingChange::insert(message));
        }
        tracing::debug!(drained, staged, "outbox messages staged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::ChangeKind;
    use crate::outbox::OutboxMessage;
    use std::sync::Arc;
    use uow_domain::aggregate_root::AggregateRoot;
    use uow_domain::domain_event::DomainEvent;
    use uow_macros::{aggregate_root, domain_event};
    use uuid::Uuid;

    #[aggregate_root]
    struct Parcel {
        weight: u32,
    }

    #[domain_event]
    struct ParcelShipped {
        weight: u32,
    }

    fn parcel(events: usize) -> Parcel {
        let mut p = Parcel {
            id: Uuid::new_v4(),
            domain_events: Default::default(),
            weight: 5,
        };
        for _ in 0..events {
            p.raise(ParcelShipped { weight: p.weight });
        }
        p
    }

    #[tokio::test]
    async fn drains_buffers_and_stages_messages() {
        let first = parcel(2);
        let second = parcel(1);
        let mut set = ChangeSet::new();
        set.stage(PendingChange::insert(first.clone()));
        set.stage(PendingChange::delete(second.clone()));

        OutboxInterceptor::new()
            .process(&mut set, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(set.len(), 5);
        assert_eq!(set.count_of(ChangeKind::Insert), 4);
        let messages: Vec<&OutboxMessage> = set
            .iter()
            .filter_map(|c| c.downcast_ref::<OutboxMessage>())
            .collect();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.message_type() == "ParcelShipped"));

        for p in [&first, &second] {
            let staged = set.find::<Parcel>(p.id).unwrap().downcast_ref::<Parcel>().unwrap();
            assert!(staged.domain_events().is_empty());
        }
    }

    #[tokio::test]
    async fn no_events_means_no_messages() {
        let mut set = ChangeSet::new();
        set.stage(PendingChange::update(parcel(0)));
        OutboxInterceptor::new()
            .process(&mut set, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
    }

    struct Failing;

    impl OutboxConverter for Failing {
        type Message = OutboxMessage;

        fn convert(&self, _: Vec<Arc<dyn DomainEvent>>) -> DomainResult<Vec<OutboxMessage>> {
            Err(DomainError::invalid_value("unsupported event"))
        }
    }

    #[tokio::test]
    async fn converter_failure_is_reported_as_interceptor_error() {
        let mut set = ChangeSet::new();
        set.stage(PendingChange::insert(parcel(1)));
        let err = OutboxInterceptor::with_converter(Failing)
            .process(&mut set, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Interceptor { ref interceptor, .. } if interceptor == "outbox"
        ));
    }
}
