use super::{RepositoryRegistry, UnitOfWork};
use crate::config::UnitOfWorkConfig;
use crate::interceptor::{AuditableInterceptor, Interceptor, OutboxInterceptor};
use crate::storage::Storage;
use bon::Builder;
use std::sync::Arc;

// 导入由 bon::Builder 生成的 typestate 模块与状态转换别名
use self::unit_of_work_factory_builder::{IsUnset, SetInterceptors, State as BuilderState};

/// 工作单元工厂：持有存储、拦截器管线与自定义仓储注册表，每次 `begin` 创建独立的工作单元
///
/// 拦截器按注册顺序运行。
#[derive(Builder, Clone)]
pub struct UnitOfWorkFactory {
    storage: Arc<dyn Storage>,
    #[builder(default)]
    interceptors: Vec<Arc<dyn Interceptor>>,
    #[builder(default)]
    custom_repositories: RepositoryRegistry,
    #[builder(default)]
    config: UnitOfWorkConfig,
}

impl<S: BuilderState> UnitOfWorkFactoryBuilder<S> {
    /// 按配置注册标准拦截器：审计在前，发件箱在后
    pub fn standard_interceptors(
        self,
        config: &UnitOfWorkConfig,
    ) -> UnitOfWorkFactoryBuilder<SetInterceptors<S>>
    where
        <S as BuilderState>::Interceptors: IsUnset,
    {
        self.interceptors(standard_interceptors(config))
    }
}

fn standard_interceptors(config: &UnitOfWorkConfig) -> Vec<Arc<dyn Interceptor>> {
    let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
    if config.auditing {
        interceptors.push(Arc::new(AuditableInterceptor::new()));
    }
    if config.outbox {
        interceptors.push(Arc::new(OutboxInterceptor::new()));
    }
    interceptors
}

impl UnitOfWorkFactory {
    /// 使用标准拦截器创建工厂
    pub fn with_standard_interceptors(storage: Arc<dyn Storage>, config: UnitOfWorkConfig) -> Self {
        Self::builder()
            .storage(storage)
            .standard_interceptors(&config)
            .config(config)
            .build()
    }

    /// 开启一个新的工作单元
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(
            self.storage.clone(),
            self.interceptors.clone(),
            &self.custom_repositories,
            self.config.clone(),
        )
    }

    pub fn interceptor_names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[test]
    fn standard_pipeline_follows_config_toggles() {
        let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());

        let factory = UnitOfWorkFactory::with_standard_interceptors(
            storage.clone(),
            UnitOfWorkConfig::default(),
        );
        assert_eq!(factory.interceptor_names(), vec!["auditable", "outbox"]);

        let factory = UnitOfWorkFactory::with_standard_interceptors(
            storage.clone(),
            UnitOfWorkConfig {
                auditing: false,
                ..Default::default()
            },
        );
        assert_eq!(factory.interceptor_names(), vec!["outbox"]);

        let bare = UnitOfWorkFactory::builder().storage(storage).build();
        assert!(bare.interceptor_names().is_empty());
        assert_eq!(bare.config().default_page_size, 20);
    }
}
