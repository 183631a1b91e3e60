//! 聚合根（AggregateRoot）
//!
//! 聚合根是一组相关对象的一致性边界，也是领域事件的唯一来源。
//! 业务逻辑通过 `raise` 追加事件，事件在提交时由发件箱拦截器一次性取出并转换为发件箱消息。
//!
use crate::{
    domain_event::{DomainEvent, DomainEvents},
    entity::Entity,
};
use std::sync::Arc;

/// 聚合根接口
pub trait AggregateRoot: Entity {
    /// 待发布事件（只读视图）
    fn domain_events(&self) -> &DomainEvents;

    fn domain_events_mut(&mut self) -> &mut DomainEvents;

    /// 追加一个领域事件
    fn raise<E>(&mut self, event: E)
    where
        E: DomainEvent,
        Self: Sized,
    {
        self.domain_events_mut().raise(event);
    }

    /// 取出并清空全部待发布事件
    fn take_domain_events(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        self.domain_events_mut().take()
    }
}
