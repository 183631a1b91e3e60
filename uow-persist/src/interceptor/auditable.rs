use super::Interceptor;
use crate::change_set::{ChangeKind, ChangeSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uow_domain::error::DomainResult;

/// 审计拦截器：新增写入创建时间，更新写入修改时间，删除与不具备审计能力的实体不处理
#[derive(Debug, Clone, Copy)]
pub struct AuditableInterceptor {
    clock: fn() -> DateTime<Utc>,
}

impl AuditableInterceptor {
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// 使用自定义时钟（便于测试）
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl Default for AuditableInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for AuditableInterceptor {
    fn name(&self) -> &str {
        "auditable"
    }

    async fn process(
        &self,
        changes: &mut ChangeSet,
        _cancel: &CancellationToken,
    ) -> DomainResult<()> {
        let now = (self.clock)();
        let mut stamped = 0usize;
        for change in changes.iter_mut() {
            let kind = change.kind();
            let Some(auditable) = change.entry_mut().auditable_mut() else {
                continue;
            };
            match kind {
                ChangeKind::Insert => auditable.set_created_at(now),
                ChangeKind::Update => auditable.set_modified_at(now),
                ChangeKind::Delete => continue,
            }
            stamped += 1;
        }
        tracing::debug!(stamped, "auditable timestamps applied");
        Ok(())
    }
}
