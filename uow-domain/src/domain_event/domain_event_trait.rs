use crate::error::DomainResult;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// 领域事件：描述聚合上已经发生的、不可变的业务事实
///
/// 以 trait object（`Arc<dyn DomainEvent>`）形式缓冲在聚合根中，
/// 因此载荷通过 `payload` 以 JSON 形式擦除类型后导出。
pub trait DomainEvent: fmt::Debug + Send + Sync + 'static {
    /// 事件类型判别名（形如 `OrderPlaced` 或 `OrderEvent.Placed`）
    fn event_type(&self) -> &str;

    /// 事件载荷版本
    fn event_version(&self) -> usize {
        1
    }

    /// 序列化后的事件载荷
    fn payload(&self) -> DomainResult<Value>;
}

/// 供宏与手写实现复用的载荷序列化
pub fn to_payload<E>(event: &E) -> DomainResult<Value>
where
    E: Serialize,
{
    Ok(serde_json::to_value(event)?)
}
