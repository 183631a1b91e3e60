//! 事务性发件箱（Transactional Outbox）
//!
//! 领域事件在提交时被转换为发件箱消息，与业务数据在同一次原子提交中落库；
//! 之后由独立的投递进程读取未处理的消息并发布（投递进程不在本 crate 范围内）。
//!
mod converter;
mod message;

pub use converter::{DefaultOutboxConverter, OutboxConverter};
pub use message::{OutboxEnvelope, OutboxMessage};
