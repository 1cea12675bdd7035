//! 单元测试使用的脚本化HTTP探测器

use crate::error::HealthCheckError;
use crate::health::probe::{HttpProbe, ProbeResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// 单次请求的预设行为
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// 返回指定状态码和响应体
    Respond(u16, Value),
    /// 等待一段时间后返回
    Slow(Duration, u16, Value),
    /// 请求失败
    Fail(String),
    /// 永不返回
    Hang,
}

/// 按URL预设响应序列的探测器，脚本耗尽后返回 200 `{}`
#[derive(Default)]
pub(crate) struct ScriptedProbe {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, url: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into());
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl HttpProbe for ScriptedProbe {
    async fn get_json(&self, url: &str) -> Result<ProbeResponse, HealthCheckError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Respond(200, json!({})));

        match step {
            Step::Respond(status_code, body) => Ok(ProbeResponse { status_code, body }),
            Step::Slow(delay, status_code, body) => {
                tokio::time::sleep(delay).await;
                Ok(ProbeResponse { status_code, body })
            }
            Step::Fail(message) => Err(HealthCheckError::Request(message)),
            Step::Hang => std::future::pending().await,
        }
    }
}
