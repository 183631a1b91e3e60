use std::future::Future;
use tokio_util::sync::CancellationToken;
use uow_domain::error::{DomainError, DomainResult};

/// 在取消令牌触发时放弃等待 `fut`，返回 `DomainError::Cancelled`
///
/// 被放弃的 future 会被直接 drop，调用方需保证其在任意 await 点被 drop 时不留下部分状态。
pub async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let value = cancellable(&token, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let err = cancellable(&token, async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, DomainError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_work() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });
        let err = cancellable(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Cancelled));
    }
}
