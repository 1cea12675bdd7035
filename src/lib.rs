//! Services Status - 服务健康状态检测库
//!
//! 周期性探测一组固定的HTTP服务，并提供单个服务和整体的健康状态：
//! - 启动前的配置校验
//! - 带超时、重试和按服务取消的HTTP探测
//! - 多服务并发检测
//! - 状态查询与汇总

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod services_status;
pub mod status;

// 重新导出主要类型
pub use config::{ServiceDescriptor, ServicesStatusConfig};
pub use error::{ConfigError, ConfigErrorKind, ServicesStatusError};
pub use health::{HealthRecord, HealthStatus, HttpProbe};
pub use services_status::ServicesStatus;
pub use status::{HealthSummary, StatusMap};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
