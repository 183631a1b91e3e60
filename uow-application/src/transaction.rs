//! 事务内执行（Execute in Transaction）
//!
//! 先等待业务操作完成，再提交工作单元；操作失败时不会提交。
//! 无论失败来自操作本身还是提交流水线，调用方都只会得到一个 `OperationFailure`。
//! 失败后待提交变更保持原样，可重试提交或调用 `discard_changes` 放弃。
//!
//! ```ignore
//! let orders = uow.get_repository::<Order>();
//! let placed = uow
//!     .execute_in_transaction(&cancel, async move {
//!         orders.create(order, &cancel).await.map_err(AppError::from)
//!     })
//!     .await?;
//! ```
//!
use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use uow_persist::UnitOfWork;

/// 统一失败码
pub const EXCEPTION_CODE: &str = "Exception.Error";

/// 统一的失败描述，面向接口层序列化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    code: String,
    message: String,
}

impl OperationFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for OperationFailure {}

impl From<AppError> for OperationFailure {
    fn from(err: AppError) -> Self {
        Self::new(EXCEPTION_CODE, err.to_string())
    }
}

pub type OperationResult<T> = Result<T, OperationFailure>;

#[async_trait]
pub trait UnitOfWorkExt: Send {
    /// 执行操作并提交，成功时返回操作的结果
    async fn execute_in_transaction<T, E, Fut>(
        &mut self,
        cancel: &CancellationToken,
        operation: Fut,
    ) -> OperationResult<T>
    where
        T: Send,
        E: Into<AppError> + Send,
        Fut: Future<Output = Result<T, E>> + Send;

    async fn execute_in_transaction_unit<E, Fut>(
        &mut self,
        cancel: &CancellationToken,
        operation: Fut,
    ) -> OperationResult<()>
    where
        E: Into<AppError> + Send,
        Fut: Future<Output = Result<(), E>> + Send,
    {
        self.execute_in_transaction(cancel, operation).await
    }
}

#[async_trait]
impl UnitOfWorkExt for UnitOfWork {
    async fn execute_in_transaction<T, E, Fut>(
        &mut self,
        cancel: &CancellationToken,
        operation: Fut,
    ) -> OperationResult<T>
    where
        T: Send,
        E: Into<AppError> + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let value = match operation.await {
            Ok(value) => value,
            Err(err) => {
                let err: AppError = err.into();
                tracing::warn!(error = %err, "operation failed, nothing committed");
                return Err(err.into());
            }
        };

        match self.save_changes(cancel).await {
            Ok(affected) => {
                tracing::debug!(affected, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, "commit failed");
                Err(AppError::from(err).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uow_domain::error::DomainError;

    #[test]
    fn app_errors_collapse_to_exception_code() {
        let failure = OperationFailure::from(AppError::Validation("name is empty".into()));
        assert_eq!(failure.code(), EXCEPTION_CODE);
        assert_eq!(failure.message(), "validation: name is empty");

        let failure = OperationFailure::from(AppError::from(DomainError::Cancelled));
        assert_eq!(failure.to_string(), "Exception.Error: domain: operation cancelled");
    }
}
