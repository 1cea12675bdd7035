//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Services Status 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum ServicesStatusError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 健康检测相关错误
    #[error("健康检测错误: {0}")]
    HealthCheck(#[from] HealthCheckError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误的类别
///
/// 调用方可以据此区分超时配置错误与其他结构性错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// 结构性配置错误
    General,
    /// `default_timeout` 无效
    Timeout,
    /// 某个服务的URL缺失或格式错误
    Validation,
}

/// 配置错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 通用配置错误
    #[error("{0}")]
    General(String),

    /// 超时配置错误
    #[error("{0}")]
    Timeout(String),

    /// 服务URL校验错误
    #[error("{0}")]
    Validation(String),

    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    Parse(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVar { var: String },
}

impl ConfigError {
    /// 返回错误类别
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::Timeout(_) => ConfigErrorKind::Timeout,
            ConfigError::Validation(_) => ConfigErrorKind::Validation,
            ConfigError::General(_)
            | ConfigError::Parse(_)
            | ConfigError::FileNotFound { .. }
            | ConfigError::EnvVar { .. } => ConfigErrorKind::General,
        }
    }
}

/// 健康检测错误类型
///
/// 只在探测内部流转，最终以文本形式写入健康记录
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckError {
    /// HTTP请求失败
    #[error("{0}")]
    Request(String),

    /// 单次请求超时
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// 响应体不是合法JSON
    #[error("Response decode error: {0}")]
    Decode(String),

    /// 探测被取消
    #[error("Health check cancelled")]
    Cancelled,
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ServicesStatusError>;
