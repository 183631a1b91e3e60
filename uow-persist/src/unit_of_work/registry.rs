//! 自定义仓储注册表
//!
//! 以显式注册替代类型扫描：每个自定义仓储类型登记一个构造函数，
//! 工作单元创建时为每个已登记类型构造一个绑定到该工作单元的实例。
//!
use crate::change_set::ChangeSet;
use crate::config::UnitOfWorkConfig;
use crate::repository::StoreRepository;
use crate::storage::Storage;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use uow_domain::entity::Entity;

pub(crate) type SharedRepository = Arc<dyn Any + Send + Sync>;

type Constructor = Arc<dyn Fn(&RepositoryScope) -> SharedRepository + Send + Sync>;

/// 自定义仓储的构造上下文：与所属工作单元共享存储与变更集
#[derive(Clone)]
pub struct RepositoryScope {
    storage: Arc<dyn Storage>,
    pending: Arc<Mutex<ChangeSet>>,
    config: UnitOfWorkConfig,
}

impl RepositoryScope {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        pending: Arc<Mutex<ChangeSet>>,
        config: UnitOfWorkConfig,
    ) -> Self {
        Self {
            storage,
            pending,
            config,
        }
    }

    /// 绑定到本工作单元的通用仓储
    pub fn repository<T: Entity>(&self) -> StoreRepository<T> {
        StoreRepository::new(self.storage.clone(), self.pending.clone())
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }
}

impl fmt::Debug for RepositoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryScope")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct RepositoryRegistry {
    constructors: HashMap<TypeId, (&'static str, Constructor)>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记自定义仓储类型 `R` 的构造函数；重复登记时后者覆盖前者
    pub fn register<R, F>(mut self, build: F) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&RepositoryScope) -> R + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move |scope: &RepositoryScope| -> SharedRepository { Arc::new(build(scope)) });
        self.constructors
            .insert(TypeId::of::<R>(), (std::any::type_name::<R>(), constructor));
        self
    }

    pub fn contains<R: 'static>(&self) -> bool {
        self.constructors.contains_key(&TypeId::of::<R>())
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub(crate) fn build(&self, scope: &RepositoryScope) -> HashMap<TypeId, SharedRepository> {
        self.constructors
            .iter()
            .map(|(type_id, (_, constructor))| (*type_id, constructor(scope)))
            .collect()
    }
}

impl fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.constructors.values().map(|(name, _)| name))
            .finish()
    }
}
