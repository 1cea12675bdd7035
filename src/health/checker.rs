//! HTTP健康检测器实现
//!
//! 对单个服务执行带超时和重试的探测，并负责按服务名取消未完成的探测

use crate::config::ServiceDescriptor;
use crate::error::HealthCheckError;
use crate::health::probe::HttpProbe;
use crate::health::record::HealthRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 一次完整探测的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// 探测已结束，包括重试耗尽后的失败记录
    Completed(HealthRecord),
    /// 探测被取消，记录不写入共享状态
    Cancelled(HealthRecord),
}

impl ProbeOutcome {
    /// 是否被取消
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeOutcome::Cancelled(_))
    }

    /// 获取健康记录
    pub fn record(&self) -> &HealthRecord {
        match self {
            ProbeOutcome::Completed(record) | ProbeOutcome::Cancelled(record) => record,
        }
    }

    /// 取出健康记录
    pub fn into_record(self) -> HealthRecord {
        match self {
            ProbeOutcome::Completed(record) | ProbeOutcome::Cancelled(record) => record,
        }
    }
}

/// 健康检测器trait，定义检测接口
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// 执行一次完整探测（含重试），失败时合成异常记录而不是返回错误
    ///
    /// # 参数
    /// * `service` - 服务描述符
    ///
    /// # 返回
    /// * `ProbeOutcome` - 检测结果，被取消的探测返回 [`ProbeOutcome::Cancelled`]
    async fn check_service(&self, service: &ServiceDescriptor) -> ProbeOutcome;

    /// 取消所有未完成的探测
    fn cancel_all(&self);

    /// 当前持有取消句柄的探测数量
    fn in_flight_count(&self) -> usize;
}

/// 正在进行的探测
struct InFlightProbe {
    /// 探测序号，用于区分同名服务的新旧探测
    id: u64,
    /// 取消令牌
    token: CancellationToken,
}

/// HTTP健康检测器实现
pub struct HttpHealthChecker {
    /// HTTP探测器
    probe: Arc<dyn HttpProbe>,
    /// 默认超时时间
    default_timeout: Duration,
    /// 最大尝试次数
    retry_attempts: u32,
    /// 重试间隔
    retry_delay: Duration,
    /// 服务名 -> 正在进行的探测
    in_flight: Mutex<HashMap<String, InFlightProbe>>,
    /// 下一个探测序号
    next_probe_id: AtomicU64,
}

impl HttpHealthChecker {
    /// 创建新的HTTP健康检测器
    ///
    /// # 参数
    /// * `probe` - HTTP探测器
    /// * `default_timeout` - 服务未设置超时时使用的超时时间
    /// * `retry_attempts` - 最大尝试次数，为0时不发出任何请求
    /// * `retry_delay` - 重试间隔
    pub fn new(
        probe: Arc<dyn HttpProbe>,
        default_timeout: Duration,
        retry_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            probe,
            default_timeout,
            retry_attempts,
            retry_delay,
            in_flight: Mutex::new(HashMap::new()),
            next_probe_id: AtomicU64::new(0),
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, InFlightProbe>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记新的探测，同名服务的旧探测会被取消
    fn register(&self, service_name: &str) -> (u64, CancellationToken) {
        let id = self.next_probe_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.lock_in_flight().insert(
            service_name.to_string(),
            InFlightProbe {
                id,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            debug!("取消服务上一次未完成的探测: {}", service_name);
            previous.token.cancel();
        }

        (id, token)
    }

    /// 清除取消句柄，只清除属于本次探测的句柄
    fn release(&self, service_name: &str, id: u64) {
        let mut in_flight = self.lock_in_flight();
        if in_flight.get(service_name).is_some_and(|probe| probe.id == id) {
            in_flight.remove(service_name);
        }
    }

    /// 执行单次HTTP请求
    async fn attempt(
        &self,
        service: &ServiceDescriptor,
        timeout_duration: Duration,
        token: &CancellationToken,
    ) -> Result<HealthRecord, HealthCheckError> {
        let start_time = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(HealthCheckError::Cancelled),
            outcome = timeout(timeout_duration, self.probe.get_json(&service.url)) => outcome,
        };

        let response = outcome.map_err(|_| HealthCheckError::Timeout {
            timeout_ms: timeout_duration.as_millis() as u64,
        })??;

        Ok(HealthRecord::from_response(
            service.name.clone(),
            service.url.clone(),
            response.status_code,
            response.body,
            start_time.elapsed(),
        ))
    }

    /// 等待重试间隔，期间被取消则返回 `false`
    async fn wait_retry_delay(&self, token: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = sleep(self.retry_delay) => true,
        }
    }
}

#[async_trait]
impl HealthChecker for HttpHealthChecker {
    async fn check_service(&self, service: &ServiceDescriptor) -> ProbeOutcome {
        let start_time = Instant::now();
        let (probe_id, token) = self.register(&service.name);
        let timeout_duration = if service.timeout.is_zero() {
            self.default_timeout
        } else {
            service.timeout
        };
        let mut last_error: Option<HealthCheckError> = None;
        let mut cancelled = false;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "检测服务: {} (第 {}/{} 次)",
                service.name, attempt, self.retry_attempts
            );

            match self.attempt(service, timeout_duration, &token).await {
                Ok(record) => {
                    self.release(&service.name, probe_id);
                    debug!("服务 {} 检测完成: {}", service.name, record.status);
                    return ProbeOutcome::Completed(record);
                }
                Err(HealthCheckError::Cancelled) => {
                    cancelled = true;
                    last_error = Some(HealthCheckError::Cancelled);
                    break;
                }
                Err(e) => {
                    warn!(
                        "服务 {} 第 {} 次检测失败: {}",
                        service.name, attempt, e
                    );
                    last_error = Some(e);

                    if attempt < self.retry_attempts && !self.wait_retry_delay(&token).await {
                        cancelled = true;
                        last_error = Some(HealthCheckError::Cancelled);
                        break;
                    }
                }
            }
        }

        self.release(&service.name, probe_id);

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());

        if cancelled {
            debug!("服务 {} 的探测已取消", service.name);
        } else {
            warn!("服务检测失败: {}, {}", service.name, error);
        }

        let record = HealthRecord::failed(
            service.name.clone(),
            service.url.clone(),
            start_time.elapsed(),
            self.retry_attempts,
            error,
        );

        if cancelled {
            ProbeOutcome::Cancelled(record)
        } else {
            ProbeOutcome::Completed(record)
        }
    }

    fn cancel_all(&self) {
        let mut in_flight = self.lock_in_flight();
        for (service_name, probe) in in_flight.drain() {
            debug!("取消探测: {}", service_name);
            probe.token.cancel();
        }
    }

    fn in_flight_count(&self) -> usize {
        self.lock_in_flight().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::record::HealthStatus;
    use crate::health::testing::{ScriptedProbe, Step};
    use serde_json::json;

    const URL: &str = "http://localhost:2500/health";

    fn create_test_service() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "auth-service".to_string(),
            url: URL.to_string(),
            timeout: Duration::from_millis(1_000),
        }
    }

    fn create_checker(probe: Arc<ScriptedProbe>, retry_attempts: u32) -> HttpHealthChecker {
        HttpHealthChecker::new(
            probe,
            Duration::from_millis(1_000),
            retry_attempts,
            Duration::from_millis(200),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_response() {
        let probe = Arc::new(
            ScriptedProbe::new().script(URL, vec![Step::Respond(200, json!({"status": "ok"}))]),
        );
        let checker = create_checker(probe.clone(), 3);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Healthy);
        assert!(record.error.is_none());
        assert!(record.last_checked.is_some());
        assert_eq!(record.status_code(), Some(200));
        assert!(record.response_time_ms().is_some());
        assert_eq!(record.details.as_ref().unwrap()["status"], "ok");
        assert_eq!(probe.call_count(), 1);
        assert_eq!(checker.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_not_retried() {
        let probe = Arc::new(
            ScriptedProbe::new().script(URL, vec![Step::Respond(500, json!({"ok": false}))]),
        );
        let checker = create_checker(probe.clone(), 3);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert!(record.error.is_none());
        assert_eq!(record.status_code(), Some(500));
        assert_eq!(probe.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let probe = Arc::new(ScriptedProbe::new().script(
            URL,
            vec![
                Step::Fail("Connection refused".to_string()),
                Step::Fail("Connection refused".to_string()),
                Step::Respond(200, json!({})),
            ],
        ));
        let checker = create_checker(probe.clone(), 3);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Healthy);
        let calls = probe.calls_to(URL);
        assert_eq!(calls.len(), 3);
        assert!(calls[1] - calls[0] >= Duration::from_millis(200));
        assert!(calls[2] - calls[1] >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_fail() {
        let probe = Arc::new(ScriptedProbe::new().script(
            URL,
            vec![
                Step::Fail("first".to_string()),
                Step::Fail("second".to_string()),
                Step::Fail("third".to_string()),
            ],
        ));
        let checker = create_checker(probe.clone(), 3);

        let outcome = checker.check_service(&create_test_service()).await;
        assert!(!outcome.is_cancelled());

        let record = outcome.into_record();
        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.error.as_deref(), Some("third"));
        assert_eq!(record.attempts(), Some(3));
        assert!(record.response_time_ms().unwrap() >= 400);
        assert_eq!(probe.call_count(), 3);
        assert_eq!(checker.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried() {
        let probe = Arc::new(
            ScriptedProbe::new().script(URL, vec![Step::Hang, Step::Respond(200, json!({}))]),
        );
        let checker = create_checker(probe.clone(), 2);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Healthy);
        let calls = probe.calls_to(URL);
        assert_eq!(calls.len(), 2);
        // 超时1000ms + 重试间隔200ms
        assert!(calls[1] - calls[0] >= Duration::from_millis(1_200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exhaustion_reports_timeout() {
        let probe = Arc::new(ScriptedProbe::new().script(URL, vec![Step::Hang]));
        let checker = create_checker(probe.clone(), 1);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(
            record.error.as_deref(),
            Some("Request timeout after 1000ms")
        );
        assert_eq!(record.attempts(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_never_probes() {
        let probe = Arc::new(ScriptedProbe::new());
        let checker = create_checker(probe.clone(), 0);

        let record = checker.check_service(&create_test_service()).await.into_record();

        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.error.as_deref(), Some("Unknown error"));
        assert_eq!(record.attempts(), Some(0));
        assert_eq!(probe.call_count(), 0);
        assert_eq!(checker.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_service_timeout_falls_back_to_default() {
        let probe = Arc::new(ScriptedProbe::new().script(URL, vec![Step::Hang]));
        let checker = HttpHealthChecker::new(
            probe,
            Duration::from_millis(300),
            1,
            Duration::ZERO,
        );
        let mut service = create_test_service();
        service.timeout = Duration::ZERO;

        let record = checker.check_service(&service).await.into_record();
        assert_eq!(record.error.as_deref(), Some("Request timeout after 300ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_aborts_in_flight_probe() {
        let probe = Arc::new(ScriptedProbe::new().script(URL, vec![Step::Hang]));
        let checker = Arc::new(create_checker(probe.clone(), 3));

        let task = {
            let checker = Arc::clone(&checker);
            tokio::spawn(async move { checker.check_service(&create_test_service()).await })
        };

        sleep(Duration::from_millis(10)).await;
        assert_eq!(checker.in_flight_count(), 1);

        checker.cancel_all();
        let outcome = task.await.unwrap();
        assert!(outcome.is_cancelled());

        let record = outcome.into_record();
        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.error.as_deref(), Some("Health check cancelled"));
        assert_eq!(probe.call_count(), 1);
        assert_eq!(checker.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_retry_delay_stops_retrying() {
        let probe = Arc::new(
            ScriptedProbe::new().script(URL, vec![Step::Fail("boom".to_string())]),
        );
        let checker = Arc::new(HttpHealthChecker::new(
            probe.clone(),
            Duration::from_millis(1_000),
            3,
            Duration::from_secs(60),
        ));

        let task = {
            let checker = Arc::clone(&checker);
            tokio::spawn(async move { checker.check_service(&create_test_service()).await })
        };

        sleep(Duration::from_millis(10)).await;
        checker.cancel_all();
        let outcome = task.await.unwrap();

        assert!(outcome.is_cancelled());
        assert_eq!(outcome.record().error.as_deref(), Some("Health check cancelled"));
        assert_eq!(probe.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_probe_supersedes_in_flight_probe() {
        let probe = Arc::new(
            ScriptedProbe::new().script(URL, vec![Step::Hang, Step::Respond(200, json!({}))]),
        );
        let checker = Arc::new(create_checker(probe.clone(), 3));

        let first = {
            let checker = Arc::clone(&checker);
            tokio::spawn(async move { checker.check_service(&create_test_service()).await })
        };
        sleep(Duration::from_millis(10)).await;

        let second = checker.check_service(&create_test_service()).await;
        let first = first.await.unwrap();

        assert!(!second.is_cancelled());
        assert_eq!(second.record().status, HealthStatus::Healthy);
        assert!(first.is_cancelled());
        assert_eq!(first.record().error.as_deref(), Some("Health check cancelled"));
        assert_eq!(probe.call_count(), 2);
        assert_eq!(checker.in_flight_count(), 0);
    }
}
