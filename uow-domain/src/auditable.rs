//! 审计能力（Auditable）
//!
//! 实体可选择实现该能力，由审计拦截器在提交前写入创建/修改时间（UTC）。
//!
use chrono::{DateTime, Utc};

/// 可审计实体
pub trait Auditable {
    /// 新增时写入创建时间
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// 更新时写入修改时间
    fn set_modified_at(&mut self, at: DateTime<Utc>);

    fn created_at(&self) -> Option<DateTime<Utc>>;

    fn modified_at(&self) -> Option<DateTime<Utc>>;
}
