//! 命令行参数定义
//!
//! 使用clap定义演示程序的命令行接口

use crate::config::get_default_config_path;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Services Status - 服务健康状态检测
#[derive(Parser, Debug, Clone)]
#[command(
    name = "services-status",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "SERVICES_STATUS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "SERVICES_STATUS_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志")]
    pub json_logs: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// 获取配置文件路径，未指定时使用默认路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(get_default_config_path)
    }
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次性健康检测
    Check {
        /// 服务名称（可选，不指定则检测所有服务）
        #[arg(value_name = "SERVICE", help = "服务名称")]
        service: Option<String>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 启动周期检测，按 Ctrl-C 停止
    Watch,

    /// 验证配置文件
    Validate,
}

/// 输出格式
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_command() {
        let args = Args::try_parse_from([
            "services-status",
            "--config",
            "custom.toml",
            "check",
            "auth-service",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.get_config_path(), PathBuf::from("custom.toml"));
        match args.command {
            Commands::Check { service, format } => {
                assert_eq!(service.as_deref(), Some("auth-service"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level_conversion() {
        let args = Args::try_parse_from(["services-status", "-l", "debug", "watch"]).unwrap();
        assert_eq!(
            log::LevelFilter::from(args.log_level),
            log::LevelFilter::Debug
        );
    }
}
