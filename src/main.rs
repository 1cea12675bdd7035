//! Services Status 演示程序入口

use anyhow::{Context, Result};
use clap::Parser;
use services_status::cli::args::{Args, Commands};
use services_status::cli::{CheckCommand, Command, ValidateCommand, WatchCommand};
use services_status::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        json_format: args.json_logs,
        ..Default::default()
    };
    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Services Status v{} 启动", services_status::VERSION);

    let command: Box<dyn Command> = match &args.command {
        Commands::Check { .. } => Box::new(CheckCommand),
        Commands::Watch => Box::new(WatchCommand::new(logging_system)),
        Commands::Validate => Box::new(ValidateCommand),
    };

    if let Err(e) = command.execute(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
