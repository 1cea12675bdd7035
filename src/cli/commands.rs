//! 命令处理逻辑
//!
//! 实现各个CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{ConfigLoader, ServicesStatusConfig, TomlConfigLoader};
use crate::error::Result;
use crate::health::HealthRecord;
use crate::logging::LoggingSystem;
use crate::services_status::ServicesStatus;
use crate::status::HealthSummary;
use async_trait::async_trait;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载并校验配置文件
async fn load_config(args: &Args) -> Result<ServicesStatusConfig> {
    let loader = TomlConfigLoader::new(true);
    Ok(loader.load_from_file(args.get_config_path()).await?)
}

/// 一次性检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check { service, format } = &args.command {
            self.perform_health_check(args, service.as_deref(), format)
                .await
        } else {
            Ok(())
        }
    }
}

impl CheckCommand {
    /// 执行健康检测
    async fn perform_health_check(
        &self,
        args: &Args,
        service_name: Option<&str>,
        format: &OutputFormat,
    ) -> Result<()> {
        let config = load_config(args).await?;
        let status = ServicesStatus::new(&config)?;

        let records: Vec<HealthRecord> = match service_name {
            Some(name) => match status.check_service(name).await {
                Some(record) => vec![record],
                None => {
                    eprintln!("未找到名为 '{name}' 的服务");
                    return Ok(());
                }
            },
            None => status.check_all_services().await.into_iter().collect(),
        };
        let summary = status.get_summary();

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "services": records,
                    "summary": summary,
                    "allHealthy": status.is_all_healthy(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                for record in &records {
                    print_record(record);
                }
                print_summary(&summary, status.is_all_healthy());
            }
        }

        Ok(())
    }
}

/// 周期检测命令
pub struct WatchCommand {
    /// 日志系统，用于输出周期汇总
    reporter: LoggingSystem,
}

impl WatchCommand {
    /// 创建周期检测命令
    ///
    /// # 参数
    /// * `reporter` - 已初始化的日志系统
    pub fn new(reporter: LoggingSystem) -> Self {
        Self { reporter }
    }
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let config = load_config(args).await?;
        let status = ServicesStatus::new(&config)?;

        status.start().await;
        print_summary(&status.get_summary(), status.is_all_healthy());
        info!("周期检测已启动，按 Ctrl-C 停止");

        let mut report = tokio::time::interval(status.config().check_interval);
        report.tick().await;

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    break;
                }
                _ = report.tick() => {
                    self.reporter.summary_log(&status.get_summary());
                    for record in status.get_unhealthy_services() {
                        self.reporter.health_record_log(&record);
                    }
                }
            }
        }

        status.stop();
        info!("已停止");
        Ok(())
    }
}

/// 配置验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let config = load_config(args).await?;
        println!(
            "配置有效: {}，服务数量: {}",
            args.get_config_path().display(),
            config.required_services.len()
        );
        Ok(())
    }
}

fn print_record(record: &HealthRecord) {
    println!("服务: {}", record.name);
    println!("  状态: {}", record.status);
    println!("  URL: {}", record.url);
    match record.last_checked {
        Some(checked) => println!("  最后检测: {}", checked.to_rfc3339()),
        None => println!("  最后检测: 从未"),
    }
    if let Some(error) = &record.error {
        println!("  错误: {error}");
    }
    if let Some(response_time) = record.response_time_ms() {
        println!("  响应时间: {response_time}ms");
    }
}

fn print_summary(summary: &HealthSummary, all_healthy: bool) {
    println!(
        "汇总: 共 {} 个服务，健康 {}，异常 {}，未知 {}",
        summary.total, summary.healthy, summary.unhealthy, summary.unknown
    );
    if all_healthy {
        println!("系统状态: 所有服务正常");
    } else {
        println!("系统状态: 存在异常服务");
    }
}
