//! 工作单元（Unit of Work）
//!
//! 一次业务操作的事务边界：
//! - 仓储按实体类型惰性创建并缓存，同一实例内重复获取返回同一个仓储；
//! - 仓储的写操作只登记变更，`save_changes` 时按注册顺序运行拦截器，再一次性原子提交；
//! - 拦截器与提交都在变更集的工作副本上进行，失败时原有待提交变更（含未取出的事件）保持不变，
//!   调用方可重试或丢弃；成功后清空待提交变更。
//!
mod factory;
mod registry;

pub use factory::UnitOfWorkFactory;
pub use registry::{RepositoryRegistry, RepositoryScope};

use crate::cancel::cancellable;
use crate::change_set::ChangeSet;
use crate::config::UnitOfWorkConfig;
use crate::interceptor::Interceptor;
use crate::paged::Page;
use crate::repository::StoreRepository;
use crate::storage::Storage;
use registry::SharedRepository;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uow_domain::{
    entity::Entity,
    error::{DomainError, DomainResult},
};

/// `save_changes` 的执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    RunningInterceptors,
    Committing,
    Committed,
    Failed,
}

pub struct UnitOfWork {
    storage: Arc<dyn Storage>,
    pending: Arc<Mutex<ChangeSet>>,
    repositories: HashMap<TypeId, SharedRepository>,
    custom_repositories: HashMap<TypeId, SharedRepository>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    config: UnitOfWorkConfig,
    state: SaveState,
}

impl UnitOfWork {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        interceptors: Vec<Arc<dyn Interceptor>>,
        registry: &RepositoryRegistry,
        config: UnitOfWorkConfig,
    ) -> Self {
        let pending = Arc::new(Mutex::new(ChangeSet::new()));
        let scope = RepositoryScope::new(storage.clone(), pending.clone(), config.clone());
        Self {
            custom_repositories: registry.build(&scope),
            storage,
            pending,
            repositories: HashMap::new(),
            interceptors,
            config,
            state: SaveState::Idle,
        }
    }

    /// 获取实体 `T` 的通用仓储（首次调用时创建）
    pub fn get_repository<T: Entity>(&mut self) -> Arc<StoreRepository<T>> {
        let key = TypeId::of::<T>();
        if let Some(repository) = self
            .repositories
            .get(&key)
            .and_then(|r| r.clone().downcast::<StoreRepository<T>>().ok())
        {
            return repository;
        }
        let repository = Arc::new(StoreRepository::<T>::new(
            self.storage.clone(),
            self.pending.clone(),
        ));
        self.repositories.insert(key, repository.clone());
        repository
    }

    /// 获取已登记的自定义仓储
    pub fn get_custom_repository<R>(&self) -> DomainResult<Arc<R>>
    where
        R: Send + Sync + 'static,
    {
        self.custom_repositories
            .get(&TypeId::of::<R>())
            .and_then(|r| r.clone().downcast::<R>().ok())
            .ok_or(DomainError::RepositoryNotRegistered {
                repository: std::any::type_name::<R>(),
            })
    }

    /// 运行拦截器并原子提交，返回受影响的记录数（业务数据与发件箱消息）
    #[instrument(skip_all, fields(interceptors = self.interceptors.len()))]
    pub async fn save_changes(&mut self, cancel: &CancellationToken) -> DomainResult<usize> {
        let result = self.run_pipeline(cancel).await;
        match &result {
            Ok(affected) => {
                self.state = SaveState::Committed;
                debug!(affected, "changes committed");
            }
            Err(err) => {
                self.state = SaveState::Failed;
                warn!(error = %err, "save changes failed");
            }
        }
        result
    }

    async fn run_pipeline(&mut self, cancel: &CancellationToken) -> DomainResult<usize> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let mut working = self.pending.lock().await.clone();
        debug!(pending = working.len(), "save changes started");

        self.state = SaveState::RunningInterceptors;
        for interceptor in &self.interceptors {
            debug!(interceptor = interceptor.name(), "running interceptor");
            cancellable(cancel, interceptor.process(&mut working, cancel)).await?;
        }

        if working.is_empty() {
            return Ok(0);
        }

        self.state = SaveState::Committing;
        let affected = cancellable(cancel, self.storage.commit(working)).await?;
        self.pending.lock().await.clear();
        Ok(affected)
    }

    /// 当前待提交的变更数
    pub async fn pending_changes(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// 丢弃全部待提交变更
    pub async fn discard_changes(&mut self) {
        self.pending.lock().await.clear();
        self.state = SaveState::Idle;
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    /// 按配置的默认分页大小构造第一页
    pub fn default_page(&self) -> Page {
        Page::new(0, self.config.default_page_size)
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("state", &self.state)
            .field("repositories", &self.repositories.len())
            .field("custom_repositories", &self.custom_repositories.len())
            .field(
                "interceptors",
                &self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
