//! 配置数据结构定义
//!
//! 定义原始配置、校验后的配置以及服务描述符

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 默认需要监控的服务名单
pub const DEFAULT_REQUIRED_SERVICES: [&str; 5] = [
    "knowledge-base",
    "auth-service",
    "user-service",
    "feedback-service",
    "courses-service",
];

/// 服务名 -> URL 映射
pub type ServiceUrls = BTreeMap<String, String>;

/// 原始配置结构
///
/// 数值字段使用 `Option<i64>`，缺失值和负值都能被表示出来，
/// 交由 [`ConfigValidator`](crate::config::ConfigValidator) 统一拒绝。
/// 所有时间单位均为毫秒。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicesStatusConfig {
    /// 必须配置URL的服务名单，决定监控名册及其顺序
    #[serde(default = "default_required_services")]
    pub required_services: Vec<String>,
    /// 各服务的健康检查URL
    pub service_urls: Option<ServiceUrls>,
    /// 单次请求超时时间（毫秒）
    pub default_timeout: Option<i64>,
    /// 周期检测间隔（毫秒）
    pub check_interval: Option<i64>,
    /// 每次探测的最大尝试次数
    pub retry_attempts: Option<i64>,
    /// 重试间隔（毫秒）
    pub retry_delay: Option<i64>,
}

fn default_required_services() -> Vec<String> {
    DEFAULT_REQUIRED_SERVICES
        .iter()
        .map(|name| name.to_string())
        .collect()
}

impl Default for ServicesStatusConfig {
    fn default() -> Self {
        Self {
            required_services: default_required_services(),
            service_urls: None,
            default_timeout: None,
            check_interval: None,
            retry_attempts: None,
            retry_delay: None,
        }
    }
}

impl ServicesStatusConfig {
    /// 以服务URL创建配置，其余数值使用常用默认值
    ///
    /// # 参数
    /// * `service_urls` - 服务名到URL的映射
    ///
    /// # 返回
    /// * `Self` - 配置实例
    pub fn new<I, K, V>(service_urls: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            service_urls: Some(
                service_urls
                    .into_iter()
                    .map(|(name, url)| (name.into(), url.into()))
                    .collect(),
            ),
            default_timeout: Some(5_000),
            check_interval: Some(30_000),
            retry_attempts: Some(3),
            retry_delay: Some(1_000),
            ..Default::default()
        }
    }

    /// 设置监控名单
    pub fn with_required_services<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_services = names.into_iter().map(Into::into).collect();
        self
    }

    /// 设置请求超时（毫秒）
    pub fn with_default_timeout(mut self, timeout_ms: i64) -> Self {
        self.default_timeout = Some(timeout_ms);
        self
    }

    /// 设置检测间隔（毫秒）
    pub fn with_check_interval(mut self, interval_ms: i64) -> Self {
        self.check_interval = Some(interval_ms);
        self
    }

    /// 设置最大尝试次数
    pub fn with_retry_attempts(mut self, attempts: i64) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    /// 设置重试间隔（毫秒）
    pub fn with_retry_delay(mut self, delay_ms: i64) -> Self {
        self.retry_delay = Some(delay_ms);
        self
    }
}

/// 服务描述符，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// 服务名称
    pub name: String,
    /// 健康检查URL
    pub url: String,
    /// 单次请求超时
    pub timeout: Duration,
}

/// 校验通过的只读配置
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    /// 监控名册，顺序与 `required_services` 一致
    pub services: Vec<ServiceDescriptor>,
    /// 默认请求超时
    pub default_timeout: Duration,
    /// 周期检测间隔
    pub check_interval: Duration,
    /// 最大尝试次数
    pub retry_attempts: u32,
    /// 重试间隔
    pub retry_delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ServicesStatusConfig::default();
        assert_eq!(config.required_services.len(), 5);
        assert_eq!(config.required_services[0], "knowledge-base");
        assert!(config.service_urls.is_none());
        assert!(config.default_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ServicesStatusConfig::new([("auth-service", "http://localhost:2500/health")])
            .with_required_services(["auth-service"])
            .with_default_timeout(250)
            .with_check_interval(1_000)
            .with_retry_attempts(2)
            .with_retry_delay(10);

        assert_eq!(config.required_services, vec!["auth-service".to_string()]);
        assert_eq!(
            config
                .service_urls
                .as_ref()
                .and_then(|urls| urls.get("auth-service"))
                .map(String::as_str),
            Some("http://localhost:2500/health")
        );
        assert_eq!(config.default_timeout, Some(250));
        assert_eq!(config.check_interval, Some(1_000));
        assert_eq!(config.retry_attempts, Some(2));
        assert_eq!(config.retry_delay, Some(10));
    }

    #[test]
    fn test_config_serialization() {
        let config = ServicesStatusConfig::new([
            ("knowledge-base", "http://localhost:4200/health"),
            ("auth-service", "http://localhost:2500/health"),
        ])
        .with_required_services(["knowledge-base", "auth-service"]);

        let serialized = toml::to_string(&config).expect("序列化失败");
        let deserialized: ServicesStatusConfig = toml::from_str(&serialized).expect("反序列化失败");
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let config: ServicesStatusConfig = toml::from_str("check_interval = 1000").unwrap();
        assert_eq!(config.check_interval, Some(1000));
        assert!(config.retry_attempts.is_none());
        assert_eq!(config.required_services.len(), DEFAULT_REQUIRED_SERVICES.len());
    }
}
