//! 领域事件（Domain Event）与事件缓冲
//!
//! 定义事件需要实现的最小接口（`DomainEvent`），以及聚合根内部按顺序、只追加的
//! 待发布事件缓冲 `DomainEvents`。

mod domain_event_trait;
mod domain_events;

pub use domain_event_trait::{DomainEvent, to_payload};
pub use domain_events::DomainEvents;
