//! 日志系统模块
//!
//! 提供结构化日志配置和初始化功能

use crate::health::HealthRecord;
use crate::status::HealthSummary;
use log::LevelFilter;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只安装一次订阅器，重复调用直接返回新的管理器实例
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `anyhow::Result<LoggingSystem>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));
        let mut state = state_mutex.lock().unwrap_or_else(PoisonError::into_inner);

        if !state.initialized {
            Self::init_log_tracer()?;
            Self::init_tracing_subscriber(&config)?;
            state.initialized = true;
            state.current_config = Some(config.clone());
        }

        Ok(Self { config })
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        LOG_TRACER_INIT
            .get_or_init(|| LogTracer::init().map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        for (module, level) in &config.module_levels {
            let directive: Directive = format!("{}={}", module, Self::level_to_string(*level))
                .parse()
                .map_err(|e| anyhow::anyhow!("无效的模块日志级别 {}: {}", module, e))?;
            env_filter = env_filter.add_directive(directive);
        }

        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(true)
                .boxed()
        } else {
            fmt::layer()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_target(true)
                .boxed()
        };

        match registry().with(env_filter).with(fmt_layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already been set") || error_msg.contains("already initialized")
                {
                    // 测试等场景下其他订阅器已经安装
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("tracing subscriber初始化失败: {}", error_msg))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> Directive {
        match level {
            LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF.into(),
            LevelFilter::Error => Directive::from(tracing::Level::ERROR),
            LevelFilter::Warn => Directive::from(tracing::Level::WARN),
            LevelFilter::Info => Directive::from(tracing::Level::INFO),
            LevelFilter::Debug => Directive::from(tracing::Level::DEBUG),
            LevelFilter::Trace => Directive::from(tracing::Level::TRACE),
        }
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .map(|state| state.lock().unwrap_or_else(PoisonError::into_inner).initialized)
            .unwrap_or(false)
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE.get().and_then(|state| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .current_config
                .clone()
        })
    }

    /// 本实例使用的日志配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 记录单个服务的健康状态
    pub fn health_record_log(&self, record: &HealthRecord) {
        if self.config.json_format {
            match serde_json::to_string(record) {
                Ok(json) => tracing::info!(target: "services_status::report", "{json}"),
                Err(e) => tracing::warn!("序列化健康记录失败: {}", e),
            }
        } else if record.status.is_healthy() {
            tracing::info!(
                "服务 {} {} ({}ms)",
                record.name,
                record.status,
                record.response_time_ms().unwrap_or(0)
            );
        } else {
            tracing::warn!(
                "服务 {} {}: {}",
                record.name,
                record.status,
                record.error.as_deref().unwrap_or("N/A")
            );
        }
    }

    /// 记录汇总信息
    pub fn summary_log(&self, summary: &HealthSummary) {
        tracing::info!(
            total = summary.total,
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            unknown = summary.unknown,
            "服务状态汇总"
        );
    }
}
