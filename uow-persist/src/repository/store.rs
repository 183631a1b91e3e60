//! 基于存储协作方与变更集的默认仓储实现
//!
use super::Repository;
use crate::cancel::cancellable;
use crate::change_set::{ChangeSet, PendingChange};
use crate::paged::{Page, PagedList};
use crate::query::Query;
use crate::storage::{Storage, load_entities};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uow_domain::{
    entity::Entity,
    error::{DomainError, DomainResult},
    specification::Specification,
};
use uuid::Uuid;

pub struct StoreRepository<T> {
    storage: Arc<dyn Storage>,
    pending: Arc<Mutex<ChangeSet>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> StoreRepository<T> {
    pub fn new(storage: Arc<dyn Storage>, pending: Arc<Mutex<ChangeSet>>) -> Self {
        Self {
            storage,
            pending,
            _marker: PhantomData,
        }
    }

    async fn stage(&self, change: PendingChange) {
        tracing::debug!(
            entity = T::TYPE,
            id = %change.id(),
            kind = ?change.kind(),
            "stage change"
        );
        self.pending.lock().await.stage(change);
    }

    async fn committed(&self) -> DomainResult<Vec<T>> {
        load_entities::<T>(self.storage.as_ref()).await
    }

    // 跟踪模式下叠加本工作单元的待提交变更
    async fn assemble(&self, query: Query<T>) -> DomainResult<Vec<T>> {
        let committed = self.committed().await?;
        if !query.is_tracking() {
            return query.evaluate(self.storage.as_ref(), None, committed).await;
        }
        // 预加载期间持有锁，根行与导航目标看到同一份待提交变更
        let pending = self.pending.lock().await;
        let rows = pending.overlay(committed);
        query
            .evaluate(self.storage.as_ref(), Some(&*pending), rows)
            .await
    }

    async fn find_committed(&self, id: Uuid) -> DomainResult<Option<T>> {
        Ok(self.committed().await?.into_iter().find(|e| e.id() == id))
    }

    async fn stage_insert(&self, entity: T) -> T {
        let (staged, returned) = detach_events(entity);
        self.stage(PendingChange::insert(staged)).await;
        returned
    }

    async fn stage_update(&self, entity: T) -> T {
        let (staged, returned) = detach_events(entity);
        self.stage(PendingChange::update(staged)).await;
        returned
    }

    async fn stage_delete(&self, entity: &T) -> DomainResult<bool> {
        match self.find_committed(entity.id()).await? {
            Some(_) => {
                self.stage(PendingChange::delete(entity.clone())).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// 待发布事件随登记的副本进入变更集，返回给调用方的副本不再持有
fn detach_events<T: Entity>(entity: T) -> (T, T) {
    let staged = entity.clone();
    let mut returned = entity;
    if let Some(buffer) = Entity::event_buffer_mut(&mut returned) {
        buffer.take();
    }
    (staged, returned)
}

fn checked_sum(values: &[Decimal]) -> DomainResult<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| DomainError::invalid_value("decimal overflow while summing"))
    })
}

impl<T> Clone for StoreRepository<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            pending: self.pending.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for StoreRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRepository")
            .field("entity", &T::TYPE)
            .finish()
    }
}

#[async_trait]
impl<T> Repository<T> for StoreRepository<T>
where
    T: Entity,
{
    async fn create(&self, entity: T, cancel: &CancellationToken) -> DomainResult<T> {
        cancellable(cancel, async move { Ok(self.stage_insert(entity).await) }).await
    }

    async fn create_many(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<T>> {
        cancellable(cancel, async move {
            let mut created = Vec::with_capacity(entities.len());
            for entity in entities {
                created.push(self.stage_insert(entity).await);
            }
            Ok(created)
        })
        .await
    }

    async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> DomainResult<bool> {
        cancellable(cancel, async move {
            match self.find_committed(id).await? {
                Some(entity) => {
                    self.stage(PendingChange::delete(entity)).await;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
        .await
    }

    async fn delete_entity(&self, entity: &T, cancel: &CancellationToken) -> DomainResult<bool> {
        cancellable(cancel, self.stage_delete(entity)).await
    }

    async fn delete_many(&self, entities: &[T], cancel: &CancellationToken) -> DomainResult<bool> {
        cancellable(cancel, async move {
            let mut all_deleted = true;
            for entity in entities {
                all_deleted &= self.stage_delete(entity).await?;
            }
            Ok(all_deleted)
        })
        .await
    }

    async fn update<F>(&self, entity: T, mutator: F, cancel: &CancellationToken) -> DomainResult<T>
    where
        F: FnOnce(&mut T) + Send,
    {
        cancellable(cancel, async move {
            let mut entity = entity;
            mutator(&mut entity);
            Ok(self.stage_update(entity).await)
        })
        .await
    }

    async fn update_by_id<F>(
        &self,
        id: Uuid,
        mutator: F,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>>
    where
        F: FnOnce(&mut T) + Send,
    {
        cancellable(cancel, async move {
            let Some(mut entity) = self.find_committed(id).await? else {
                return Ok(None);
            };
            mutator(&mut entity);
            Ok(Some(self.stage_update(entity).await))
        })
        .await
    }

    async fn update_many<F>(
        &self,
        entities: Vec<T>,
        mutator: F,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<T>>
    where
        F: Fn(&mut T) + Send + Sync,
    {
        cancellable(cancel, async move {
            let mut updated = Vec::with_capacity(entities.len());
            for mut entity in entities {
                mutator(&mut entity);
                updated.push(self.stage_update(entity).await);
            }
            Ok(updated)
        })
        .await
    }

    async fn get_by_id(
        &self,
        id: Uuid,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>> {
        let query = query.filter(move |e: &T| e.id() == id);
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_by_id_as<R, F>(
        &self,
        id: Uuid,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send,
    {
        let found = self.get_by_id(id, query, cancel).await?;
        Ok(found.as_ref().map(selector))
    }

    async fn get_all(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<Vec<T>> {
        cancellable(cancel, self.assemble(query)).await
    }

    async fn get_all_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send,
    {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.iter().map(selector).collect())
    }

    async fn get_paged_list(
        &self,
        query: Query<T>,
        page: Page,
        cancel: &CancellationToken,
    ) -> DomainResult<PagedList<T>> {
        if page.size == 0 {
            return Err(DomainError::invalid_value("page size must be greater than zero"));
        }
        let rows = cancellable(cancel, self.assemble(query)).await?;
        PagedList::from_rows(rows, page)
    }

    async fn get_paged_list_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        page: Page,
        cancel: &CancellationToken,
    ) -> DomainResult<PagedList<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send,
    {
        let paged = self.get_paged_list(query, page, cancel).await?;
        Ok(paged.map(|entity| selector(&entity)))
    }

    async fn get_first_or_default(
        &self,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<T>> {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_first_or_default_as<R, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<R>>
    where
        R: Send,
        F: Fn(&T) -> R + Send,
    {
        let first = self.get_first_or_default(query, cancel).await?;
        Ok(first.as_ref().map(selector))
    }

    async fn count(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<usize> {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.len())
    }

    async fn exists(&self, query: Query<T>, cancel: &CancellationToken) -> DomainResult<bool> {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(!rows.is_empty())
    }

    async fn all<S>(&self, spec: S, cancel: &CancellationToken) -> DomainResult<bool>
    where
        S: Specification<T> + 'static,
    {
        let rows = cancellable(cancel, self.committed()).await?;
        Ok(rows.iter().all(|row| spec.is_satisfied_by(row)))
    }

    async fn max<P, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<P>>
    where
        P: Ord + Send,
        F: Fn(&T) -> P + Send,
    {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.iter().map(selector).max())
    }

    async fn min<P, F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<P>>
    where
        P: Ord + Send,
        F: Fn(&T) -> P + Send,
    {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        Ok(rows.iter().map(selector).min())
    }

    async fn average<F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Option<Decimal>>
    where
        F: Fn(&T) -> Decimal + Send,
    {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let values: Vec<Decimal> = rows.iter().map(selector).collect();
        let total = checked_sum(&values)?;
        total
            .checked_div(Decimal::from(values.len()))
            .map(Some)
            .ok_or_else(|| DomainError::invalid_value("decimal overflow while averaging"))
    }

    async fn sum<F>(
        &self,
        selector: F,
        query: Query<T>,
        cancel: &CancellationToken,
    ) -> DomainResult<Decimal>
    where
        F: Fn(&T) -> Decimal + Send,
    {
        let rows = cancellable(cancel, self.assemble(query)).await?;
        let values: Vec<Decimal> = rows.iter().map(selector).collect();
        checked_sum(&values)
    }
}
