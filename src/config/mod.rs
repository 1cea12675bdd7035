//! 配置管理模块
//!
//! 提供配置结构、校验和TOML加载功能

pub mod loader;
pub mod types;
pub mod validator;

// 重新导出主要类型
pub use loader::{get_default_config_path, ConfigLoader, TomlConfigLoader};
pub use types::{
    ServiceDescriptor, ServiceUrls, ServicesStatusConfig, ValidatedConfig,
    DEFAULT_REQUIRED_SERVICES,
};
pub use validator::{service_url, ConfigValidator};
