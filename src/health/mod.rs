//! 健康检测模块
//!
//! 提供HTTP探测、带重试的健康检测和多服务编排功能

pub mod checker;
pub mod manager;
pub mod probe;
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出主要类型
pub use checker::{HealthChecker, HttpHealthChecker, ProbeOutcome};
pub use manager::ServiceManager;
pub use probe::{HttpProbe, ProbeResponse, ReqwestProbe};
pub use record::{HealthRecord, HealthStatus};
