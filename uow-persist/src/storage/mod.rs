//! 存储协作方（Storage）
//!
//! 工作单元对底层存储只依赖两项能力：
//! - `load`：按表读取已提交的行；
//! - `commit`：原子地应用整个变更集（全部成功或全部失败）。
//!
//! 事务、连接与 SQL 方言均属于具体实现，`InMemoryStorage` 为参考实现与测试替身。
//!
mod entry;
mod in_memory;

pub use entry::{EntityEntry, TableId};
pub use in_memory::InMemoryStorage;

use crate::change_set::ChangeSet;
use async_trait::async_trait;
use std::sync::Arc;
use uow_domain::{entity::Entity, error::DomainResult};

#[async_trait]
pub trait Storage: Send + Sync {
    /// 读取某表全部已提交的行（按写入顺序）
    async fn load(&self, table: TableId) -> DomainResult<Vec<Box<dyn EntityEntry>>>;

    /// 原子提交，返回受影响的记录数
    ///
    /// 插入已存在的标识、更新或删除不存在的标识均视为并发冲突，整批回滚。
    async fn commit(&self, changes: ChangeSet) -> DomainResult<usize>;
}

#[async_trait]
impl<S> Storage for Arc<S>
where
    S: Storage + ?Sized,
{
    async fn load(&self, table: TableId) -> DomainResult<Vec<Box<dyn EntityEntry>>> {
        (**self).load(table).await
    }

    async fn commit(&self, changes: ChangeSet) -> DomainResult<usize> {
        (**self).commit(changes).await
    }
}

/// 读取某实体类型的全部已提交行
pub async fn load_entities<T: Entity>(storage: &dyn Storage) -> DomainResult<Vec<T>> {
    storage
        .load(TableId::of::<T>())
        .await?
        .into_iter()
        .map(|entry| entry.downcast::<T>())
        .collect()
}
