//! 通用仓储（Repository）
//!
//! 写操作只在工作单元的变更集中登记变更，读操作按查询规约组装结果。
//! 所有方法的最后一个参数均为取消令牌。
//!
mod store;

pub use store::StoreRepository;

use crate::paged::{Page, PagedList};
use crate::query::Query;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uow_domain::{entity::Entity, error::DomainResult, specification::Specification};
use uuid::Uuid;

#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Entity,
{
    // --- 写入 ---

    /// 登记新增；聚合根的待发布事件随登记转移，返回的副本事件缓冲为空
    async fn create(&self, entity: T, cancel: &CancellationToken) -> DomainResult<T>;

    async fn create_many(&self, entities: Vec<T>, cancel: &CancellationToken)
    -> DomainResult<Vec<T>>;

    /// 按标识删除（基于已提交数据查找）；不存在时返回 `false`
    async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> DomainResult<bool>;

    async fn delete_entity(&self, entity: &T, cancel: &CancellationToken) -> DomainResult<bool>;

    /// 逐个尝试删除，全部成功时返回 `true`
    async fn delete_many(&self, entities: &[T], cancel: &CancellationToken) -> DomainResult<bool>;

    async fn update<F>(&self, entity: T, mutator: F, cancel: &CancellationToken) -> DomainResult<T>
    where
        F: FnOnce(&mut T) + Send;

    /// 按标识更新；不存在时返回 `None`
    async fn update_by_id<F>(
        &self,
        id: Uuid,
        mutator: F,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>>
    where
        F: FnOnce(&mut T) + Send;

    async fn update_many<F>(
        &self,
        entities: Vec<T>,
        mutator: F,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<T>>
    where
        F: Fn(&mut T) + Send + Sync;

    // --- 读取 ---

    async fn get_by_id(
        &self,
        id: Uuid,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>>;

    async fn get_by_id_as<R, F>(
        &self,
        id: Uuid,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send;

    async fn get_all(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<Vec<T>>;

    async fn get_all_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send;

    async fn get_paged_list(
        &self,
        query: Query<T>,
        page: Page,
        cancel: &CancellationToken,
    ) -> DomainResult<PagedList<T>>;

    async fn get_paged_list_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        page: Page,
        cancel: &CancellationToken,
    ) -> DomainResult<PagedList<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send;

    async fn get_first_or_default(
        &self,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>>;

    async fn get_first_or_default_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send;

    // --- 聚合 ---

    async fn count(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<usize>;

    async fn exists(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<bool>;

    /// 全部已提交的行是否都满足规约（空集为 `true`）
    async fn all<S>(&self, spec: S, cancel: &CancellationToken) -> DomainResult<bool>
    where
        S: Specification<T> + 'static;

    async fn max<P, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<P>>
    where
        P: Ord + Send,
        F: Fn(&T) -> P + Send;

    async fn min<P, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<P>>
    where
        P: Ord + Send,
        F: Fn(&T) -> P + Send;

    /// 平均值；空集返回 `None`
    async fn average<F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<Decimal>>
    where
        F: Fn(&T) -> Decimal + Send;

    /// 求和；空集返回零
    async fn sum<F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Decimal>
    where
        F: Fn(&T) -> Decimal + Send;
}
