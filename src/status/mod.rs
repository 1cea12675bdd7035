//! 服务状态模块
//!
//! 共享健康状态及其只读查询

pub mod query;
pub mod store;

// 重新导出主要类型
pub use query::{HealthSummary, StatusQuery};
pub use store::{HealthStore, StatusMap};
