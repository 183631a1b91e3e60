//! 应用层便捷封装（uow-application）
//!
//! 在一次工作单元内执行业务操作并提交，将任何失败统一转换为 `OperationFailure`。
//!
pub mod error;
pub mod transaction;

pub use error::AppError;
pub use transaction::{EXCEPTION_CODE, OperationFailure, OperationResult, UnitOfWorkExt};
