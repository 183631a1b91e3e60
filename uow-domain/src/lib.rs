//! 领域模型基础库（uow-domain）
//!
//! 为工作单元（Unit of Work）与事务性发件箱（Transactional Outbox）提供领域层抽象：
//! - 实体（`entity`）：128 位唯一标识与可选能力钩子（审计、事件缓冲）
//! - 聚合根（`aggregate_root`）：按顺序缓冲待发布的领域事件
//! - 领域事件（`domain_event`）：事件类型、版本与可序列化载荷
//! - 审计能力（`auditable`）：创建/修改时间戳
//! - 规约（`specification`）：可组合的查询谓词
//!
//! 本 crate 不依赖任何存储实现，仓储、拦截器与工作单元位于 `uow-persist`。
//!
pub mod aggregate_root;
pub mod auditable;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod specification;

// 允许在本 crate 内部通过 ::uow_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::uow_domain 路径。
extern crate self as uow_domain;

#[doc(hidden)]
pub mod __private {
    pub use chrono;
    pub use serde_json;
    pub use uuid;
}
