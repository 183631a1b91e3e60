use crate::paged::DEFAULT_PAGE_SIZE;
use serde::Deserialize;

/// 工作单元配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkConfig {
    /// 未显式指定分页大小时使用的默认值
    pub default_page_size: usize,
    /// 是否注册审计拦截器
    pub auditing: bool,
    /// 是否注册发件箱拦截器
    pub outbox: bool,
}

impl Default for UnitOfWorkConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            auditing: true,
            outbox: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg: UnitOfWorkConfig = serde_json::from_str(r#"{ "outbox": false }"#).unwrap();
        assert_eq!(cfg.default_page_size, 20);
        assert!(cfg.auditing);
        assert!(!cfg.outbox);
    }
}
