//! 实体（Entity）基础抽象
//!
//! 为实体与聚合根提供统一的 128 位标识，以及两个可选能力钩子：
//! - `as_auditable_mut`：实体具备审计时间戳时返回 `Some`；
//! - `event_buffer_mut`：实体是聚合根、缓冲了领域事件时返回 `Some`。
//!
//! 拦截器在提交前对每个待提交实体做一次能力探测，而不依赖基类继承。
//!
use crate::{auditable::Auditable, domain_event::DomainEvents};
use std::fmt::Debug;
use uuid::Uuid;

/// 具备唯一标识的实体抽象
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// 实体类型名（同时作为存储表的判别名）
    const TYPE: &'static str;

    /// 获取实体标识（创建后不可变，在同类实体中唯一）
    fn id(&self) -> Uuid;

    /// 审计能力探测
    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        None
    }

    /// 领域事件缓冲探测（仅聚合根返回 `Some`）
    fn event_buffer_mut(&mut self) -> Option<&mut DomainEvents> {
        None
    }
}
