use super::OutboxMessage;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uow_domain::{domain_event::DomainEvent, entity::Entity, error::DomainResult};

/// 领域事件到发件箱消息的转换策略
pub trait OutboxConverter: Send + Sync {
    type Message: Entity;

    /// 按输入顺序转换一批事件
    fn convert(&self, events: Vec<Arc<dyn DomainEvent>>) -> DomainResult<Vec<Self::Message>>;
}

/// 默认转换：新生成的 v4 标识、当前 UTC 时间、事件类型名以及 JSON 信封
///
/// 同一批消息的 `occurred_at_utc` 单调不减，保持事件的先后顺序。
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultOutboxConverter;

impl OutboxConverter for DefaultOutboxConverter {
    type Message = OutboxMessage;

    fn convert(&self, events: Vec<Arc<dyn DomainEvent>>) -> DomainResult<Vec<OutboxMessage>> {
        let mut last: Option<DateTime<Utc>> = None;
        events
            .iter()
            .map(|event| {
                let now = Utc::now();
                let at = last.map_or(now, |prev| prev.max(now));
                last = Some(at);
                OutboxMessage::from_event(event.as_ref(), at)
            })
            .collect()
    }
}
