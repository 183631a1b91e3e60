//! 领域层统一错误定义
//!
//! 聚焦序列化、提交/并发冲突、拦截器、仓储注册与取消等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 仓储/持久化 ---
    #[error("repository not registered: {repository}")]
    RepositoryNotRegistered { repository: &'static str },
    #[error("database error: {reason}")]
    Database { reason: String },
    #[error("concurrency conflict: type={entity_type}, id={id}, reason={reason}")]
    Concurrency {
        entity_type: &'static str,
        id: uuid::Uuid,
        reason: String,
    },

    // --- 提交流水线 ---
    #[error("interceptor failed: interceptor={interceptor}, reason={reason}")]
    Interceptor { interceptor: String, reason: String },
    #[error("operation cancelled")]
    Cancelled,

    // --- 领域规则/参数 ---
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
}

impl DomainError {
    pub fn interceptor(interceptor: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Interceptor {
            interceptor: interceptor.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        DomainError::InvalidValue {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
