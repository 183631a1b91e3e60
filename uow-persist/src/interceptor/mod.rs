//! 提交拦截器（Interceptor）
//!
//! 工作单元在物理提交前按注册顺序调用每个拦截器，拦截器可修改或追加变更。
//! 任一拦截器失败都会中止整个提交。
//!
mod auditable;
mod outbox;

pub use auditable::AuditableInterceptor;
pub use outbox::OutboxInterceptor;

use crate::change_set::ChangeSet;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uow_domain::error::DomainResult;

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// 拦截器名称（用于日志与错误信息）
    fn name(&self) -> &str;

    async fn process(&self, changes: &mut ChangeSet, cancel: &CancellationToken)
    -> DomainResult<()>;
}
