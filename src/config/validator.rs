//! 配置校验
//!
//! 在任何组件运行之前校验配置，首个错误即返回

use crate::config::types::{ServiceDescriptor, ServiceUrls, ServicesStatusConfig, ValidatedConfig};
use crate::error::ConfigError;
use reqwest::Url;
use std::collections::HashSet;
use std::time::Duration;

/// 配置校验器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 校验配置，不修改配置本身
    ///
    /// # 参数
    /// * `config` - 原始配置
    ///
    /// # 返回
    /// * `Result<(), ConfigError>` - 校验结果
    pub fn validate(config: &ServicesStatusConfig) -> Result<(), ConfigError> {
        let service_urls = config
            .service_urls
            .as_ref()
            .ok_or_else(|| ConfigError::General("Service URLs are required".to_string()))?;

        if !matches!(config.default_timeout, Some(timeout) if timeout > 0) {
            return Err(ConfigError::Timeout(
                "Valid defaultTimeout (positive number) is required".to_string(),
            ));
        }

        if !matches!(config.check_interval, Some(interval) if interval > 0) {
            return Err(ConfigError::General(
                "Valid checkInterval (positive number) is required".to_string(),
            ));
        }

        if !matches!(config.retry_attempts, Some(attempts) if (0..=u32::MAX as i64).contains(&attempts))
        {
            return Err(ConfigError::General(
                "Valid retryAttempts (non-negative number) is required".to_string(),
            ));
        }

        if !matches!(config.retry_delay, Some(delay) if delay >= 0) {
            return Err(ConfigError::General(
                "Valid retryDelay (non-negative number) is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &config.required_services {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::General(format!(
                    "Duplicate required service: {name}"
                )));
            }
        }

        Self::validate_service_urls(service_urls, &config.required_services)
    }

    /// 校验并构建只读配置与服务名册
    ///
    /// # 参数
    /// * `config` - 原始配置
    ///
    /// # 返回
    /// * `Result<ValidatedConfig, ConfigError>` - 校验后的配置
    pub fn validated(config: &ServicesStatusConfig) -> Result<ValidatedConfig, ConfigError> {
        Self::validate(config)?;

        // validate() 已保证以下字段存在且取值合法
        let default_timeout = Duration::from_millis(config.default_timeout.unwrap_or(0) as u64);
        let check_interval = Duration::from_millis(config.check_interval.unwrap_or(0) as u64);
        let retry_attempts = config.retry_attempts.unwrap_or(0) as u32;
        let retry_delay = Duration::from_millis(config.retry_delay.unwrap_or(0) as u64);
        let service_urls = config.service_urls.clone().unwrap_or_default();

        let services = config
            .required_services
            .iter()
            .map(|name| {
                Ok(ServiceDescriptor {
                    name: name.clone(),
                    url: service_url(&service_urls, name)?.to_string(),
                    timeout: default_timeout,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(ValidatedConfig {
            services,
            default_timeout,
            check_interval,
            retry_attempts,
            retry_delay,
        })
    }

    /// 按名册顺序逐个校验服务URL
    fn validate_service_urls(
        service_urls: &ServiceUrls,
        required_services: &[String],
    ) -> Result<(), ConfigError> {
        for name in required_services {
            let url = match service_urls.get(name) {
                Some(url) if !url.is_empty() => url,
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "URL is required for service: {name}"
                    )))
                }
            };

            if Url::parse(url).is_err() {
                return Err(ConfigError::Validation(format!(
                    "Invalid URL for service {name}: {url}"
                )));
            }
        }

        Ok(())
    }
}

/// 按服务名查找URL
///
/// # 参数
/// * `service_urls` - 服务URL映射
/// * `name` - 服务名称
///
/// # 返回
/// * `Result<&str, ConfigError>` - URL，未知服务返回校验错误
pub fn service_url<'a>(service_urls: &'a ServiceUrls, name: &str) -> Result<&'a str, ConfigError> {
    service_urls
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::Validation(format!("Unknown service: {name}")))
}
