//! HTTP探测传输层
//!
//! 把单次 `GET` 请求抽象为trait，默认实现基于reqwest

use crate::error::HealthCheckError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;

/// 一次完成的HTTP响应
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 解码后的JSON响应体
    pub body: Value,
}

/// HTTP探测trait，定义单次请求接口
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// 以 `Accept: application/json` 发送GET请求并解码JSON响应体
    ///
    /// 无论状态码如何都会解码响应体，解码失败返回 [`HealthCheckError::Decode`]
    ///
    /// # 参数
    /// * `url` - 健康检查URL
    ///
    /// # 返回
    /// * `Result<ProbeResponse, HealthCheckError>` - 响应或传输错误
    async fn get_json(&self, url: &str) -> Result<ProbeResponse, HealthCheckError>;
}

/// 基于reqwest的HTTP探测实现
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    /// HTTP客户端
    client: Client,
}

impl ReqwestProbe {
    /// 创建新的探测器
    ///
    /// 超时由调用方按次控制，客户端本身不设置超时
    pub fn new() -> Result<Self, HealthCheckError> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| HealthCheckError::Request(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }

    /// 使用已有客户端创建探测器
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get_json(&self, url: &str) -> Result<ProbeResponse, HealthCheckError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| HealthCheckError::Request(format_request_error(&e)))?;

        let status_code = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| HealthCheckError::Decode(e.to_string()))?;

        Ok(ProbeResponse { status_code, body })
    }
}

/// 格式化请求错误信息，使其更加清晰易读
fn format_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_builder() {
        format!("Invalid request: {error}")
    } else {
        let error_str = error.to_string();
        let lower = error_str.to_lowercase();
        if lower.contains("dns") {
            "DNS resolution failed".to_string()
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            "SSL/TLS certificate error".to_string()
        } else {
            format!("Request failed: {error_str}")
        }
    }
}
