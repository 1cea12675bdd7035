//! 健康记录数据结构
//!
//! 定义单个服务最近一次检测的快照和状态枚举

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// 健康状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// 服务正常
    Healthy,
    /// 服务异常
    Unhealthy,
    /// 尚未完成首次检测
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl HealthStatus {
    /// 判断状态是否为健康
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// 健康记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// 服务URL
    pub url: String,
    /// 服务名称
    pub name: String,
    /// 健康状态
    pub status: HealthStatus,
    /// 最后检测时间，首次检测前为空
    pub last_checked: Option<DateTime<Utc>>,
    /// 响应元数据
    pub details: Option<Value>,
    /// 错误信息
    pub error: Option<String>,
}

impl HealthRecord {
    /// 创建尚未检测的初始记录
    ///
    /// # 参数
    /// * `name` - 服务名称
    /// * `url` - 服务URL
    ///
    /// # 返回
    /// * `Self` - 状态为 `Unknown` 的记录
    pub fn unknown(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            status: HealthStatus::Unknown,
            last_checked: None,
            details: None,
            error: None,
        }
    }

    /// 根据一次完成的HTTP响应创建记录
    ///
    /// 2xx 视为健康，其余状态码视为异常；`error` 始终为空。
    /// JSON对象响应体按字段合并进 `details`，其他JSON值放在 `details.body` 下，
    /// 随后写入 `responseTime` 与 `statusCode`。
    pub fn from_response(
        name: impl Into<String>,
        url: impl Into<String>,
        status_code: u16,
        body: Value,
        response_time: Duration,
    ) -> Self {
        let mut details = match body {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                map
            }
        };
        details.insert(
            "responseTime".to_string(),
            Value::from(response_time.as_millis() as u64),
        );
        details.insert("statusCode".to_string(), Value::from(status_code));

        let status = if (200..300).contains(&status_code) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            url: url.into(),
            name: name.into(),
            status,
            last_checked: Some(Utc::now()),
            details: Some(Value::Object(details)),
            error: None,
        }
    }

    /// 创建重试耗尽后的失败记录
    pub fn failed(
        name: impl Into<String>,
        url: impl Into<String>,
        response_time: Duration,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        let mut details = Map::new();
        details.insert(
            "responseTime".to_string(),
            Value::from(response_time.as_millis() as u64),
        );
        details.insert("attempts".to_string(), Value::from(attempts));

        Self {
            url: url.into(),
            name: name.into(),
            status: HealthStatus::Unhealthy,
            last_checked: Some(Utc::now()),
            details: Some(Value::Object(details)),
            error: Some(error.into()),
        }
    }

    /// 获取响应时间（毫秒）
    pub fn response_time_ms(&self) -> Option<u64> {
        self.detail_u64("responseTime")
    }

    /// 获取HTTP状态码
    pub fn status_code(&self) -> Option<u16> {
        self.detail_u64("statusCode").map(|code| code as u16)
    }

    /// 获取失败记录中的尝试次数
    pub fn attempts(&self) -> Option<u32> {
        self.detail_u64("attempts").map(|attempts| attempts as u32)
    }

    fn detail_u64(&self, key: &str) -> Option<u64> {
        self.details.as_ref()?.get(key)?.as_u64()
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
