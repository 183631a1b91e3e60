//! 工作单元与事务性发件箱（uow-persist）
//!
//! - `repository`：通用仓储，写操作登记变更，读操作支持过滤、预加载、排序、分页与聚合
//! - `query`：查询规约与类型化的预加载图
//! - `change_set`：待提交变更（Insert / Update / Delete）
//! - `interceptor`：提交前的拦截器管线（审计、发件箱）
//! - `outbox`：发件箱消息与事件转换
//! - `unit_of_work`：工作单元、工厂与自定义仓储注册表
//! - `storage`：存储协作方协议与内存实现
//!
pub mod cancel;
pub mod change_set;
pub mod config;
pub mod interceptor;
pub mod outbox;
pub mod paged;
pub mod query;
pub mod repository;
pub mod storage;
pub mod unit_of_work;

pub use change_set::{ChangeKind, ChangeSet, PendingChange};
pub use config::UnitOfWorkConfig;
pub use paged::{Page, PagedList};
pub use query::Query;
pub use repository::{Repository, StoreRepository};
pub use unit_of_work::{RepositoryRegistry, RepositoryScope, SaveState, UnitOfWork, UnitOfWorkFactory};
