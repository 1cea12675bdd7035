//! 服务状态门面
//!
//! 组装配置校验、健康检测、编排与查询，并负责周期检测定时器

use crate::config::{ConfigValidator, ServiceDescriptor, ServicesStatusConfig, ValidatedConfig};
use crate::error::{ConfigError, Result};
use crate::health::{
    HealthRecord, HttpHealthChecker, HttpProbe, ReqwestProbe, ServiceManager,
};
use crate::status::{HealthStore, HealthSummary, StatusMap, StatusQuery};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// 服务状态监控器
///
/// 初始为停止状态；[`start`](Self::start) 后进入运行状态，按固定间隔重复检测，
/// 直到 [`stop`](Self::stop)。手动检测和查询在两种状态下都可以使用。
pub struct ServicesStatus {
    /// 校验后的配置
    config: ValidatedConfig,
    /// 服务编排器
    manager: Arc<ServiceManager>,
    /// 状态查询器
    query: StatusQuery,
    /// 运行状态与周期检测任务
    scheduler: Mutex<SchedulerState>,
}

/// 调度状态
#[derive(Default)]
struct SchedulerState {
    /// 是否处于运行状态
    running: bool,
    /// 每次启动或停止递增，用于识别过期的启动流程
    generation: u64,
    /// 周期检测任务
    ticker: Option<JoinHandle<()>>,
}

impl ServicesStatus {
    /// 使用reqwest探测器创建监控器
    ///
    /// # 参数
    /// * `config` - 原始配置
    ///
    /// # 返回
    /// * `Result<Self>` - 配置无效时返回配置错误，不会产生部分构造的实例
    pub fn new(config: &ServicesStatusConfig) -> Result<Self> {
        let validated = ConfigValidator::validated(config)?;
        let probe = ReqwestProbe::new()?;
        Ok(Self::from_validated(validated, Arc::new(probe)))
    }

    /// 使用指定的HTTP探测器创建监控器
    pub fn with_probe(
        config: &ServicesStatusConfig,
        probe: Arc<dyn HttpProbe>,
    ) -> std::result::Result<Self, ConfigError> {
        let validated = ConfigValidator::validated(config)?;
        Ok(Self::from_validated(validated, probe))
    }

    fn from_validated(config: ValidatedConfig, probe: Arc<dyn HttpProbe>) -> Self {
        let store = HealthStore::from_services(&config.services);
        let checker = Arc::new(HttpHealthChecker::new(
            probe,
            config.default_timeout,
            config.retry_attempts,
            config.retry_delay,
        ));
        let manager = Arc::new(ServiceManager::new(
            config.services.clone(),
            checker,
            store.clone(),
        ));

        info!("服务状态监控器已创建，服务数量: {}", config.services.len());

        Self {
            config,
            manager,
            query: StatusQuery::new(store),
            scheduler: Mutex::new(SchedulerState::default()),
        }
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, SchedulerState> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 启动周期检测
    ///
    /// 先完成一次全量检测，再按 `check_interval` 启动定时器。
    /// 运行中再次调用会替换旧定时器；首次检测期间调用了 [`stop`](Self::stop)
    /// 或再次启动时，本次调用不会启动定时器。
    pub async fn start(&self) {
        info!(
            "启动周期检测，间隔: {}ms",
            self.config.check_interval.as_millis()
        );

        let (generation, previous) = {
            let mut scheduler = self.lock_scheduler();
            scheduler.running = true;
            scheduler.generation += 1;
            (scheduler.generation, scheduler.ticker.take())
        };

        if let Some(previous) = previous {
            debug!("替换已有的检测定时器");
            previous.abort();
            // 被中止的检测不会释放自己的取消句柄
            self.manager.cancel_all();
        }

        self.manager.check_all_services().await;

        let mut scheduler = self.lock_scheduler();
        if !scheduler.running || scheduler.generation != generation {
            debug!("首次检测期间状态已改变，不启动定时器");
            return;
        }

        let manager = Arc::clone(&self.manager);
        let period = self.config.check_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            // 任务句柄随定时器一起释放，定时器被中止时未完成的检测也会被中止
            let mut cycles = JoinSet::new();

            loop {
                ticker.tick().await;
                while cycles.try_join_next().is_some() {}

                debug!("定时触发全量检测");
                let manager = Arc::clone(&manager);
                cycles.spawn(async move { manager.check_all_services().await });
            }
        });

        scheduler.ticker = Some(handle);
    }

    /// 停止周期检测并取消所有未完成的探测
    ///
    /// 可重复调用；对正在进行首次检测的 [`start`](Self::start) 同样生效。
    pub fn stop(&self) {
        let (was_running, ticker) = {
            let mut scheduler = self.lock_scheduler();
            let was_running = scheduler.running;
            scheduler.running = false;
            scheduler.generation += 1;
            (was_running, scheduler.ticker.take())
        };

        if let Some(handle) = ticker {
            handle.abort();
        }
        self.manager.cancel_all();

        if was_running {
            info!("周期检测已停止");
        }
    }

    /// 是否处于运行状态
    pub fn is_running(&self) -> bool {
        self.lock_scheduler().running
    }

    /// 当前未完成的探测数量
    pub fn in_flight_count(&self) -> usize {
        self.manager.in_flight_count()
    }

    /// 立即检测所有服务
    ///
    /// # 返回
    /// * `StatusMap` - 全部探测结束后的状态快照
    pub async fn check_all_services(&self) -> StatusMap {
        self.manager.check_all_services().await;
        self.query.get_all_statuses()
    }

    /// 立即检测单个服务，未配置的服务返回 `None`
    pub async fn check_service(&self, name: &str) -> Option<HealthRecord> {
        self.manager.check_service(name).await
    }

    /// 服务名册
    pub fn services(&self) -> &[ServiceDescriptor] {
        self.manager.services()
    }

    /// 校验后的配置
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// 获取单个服务的健康记录
    pub fn get_status(&self, name: &str) -> Option<HealthRecord> {
        self.query.get_status(name)
    }

    /// 获取所有服务状态的快照
    pub fn get_all_statuses(&self) -> StatusMap {
        self.query.get_all_statuses()
    }

    /// 获取健康的服务
    pub fn get_healthy_services(&self) -> Vec<HealthRecord> {
        self.query.get_healthy_services()
    }

    /// 获取异常的服务
    pub fn get_unhealthy_services(&self) -> Vec<HealthRecord> {
        self.query.get_unhealthy_services()
    }

    /// 获取尚未检测的服务
    pub fn get_unknown_services(&self) -> Vec<HealthRecord> {
        self.query.get_unknown_services()
    }

    /// 所有服务是否都健康，没有服务时返回 `true`
    pub fn is_all_healthy(&self) -> bool {
        self.query.is_all_healthy()
    }

    /// 获取状态汇总
    pub fn get_summary(&self) -> HealthSummary {
        self.query.get_summary()
    }
}

impl Drop for ServicesStatus {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_scheduler().ticker.take() {
            handle.abort();
        }
        self.manager.cancel_all();
    }
}
