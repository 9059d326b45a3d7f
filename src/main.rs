use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use orgair_config::{AppConfig, LogFormat};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod shutdown;

use app::Application;
use shutdown::{ShutdownManager, SHUTDOWN_TIMEOUT};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("orgair")
        .version(env!("CARGO_PKG_VERSION"))
        .about("行业配置缓存与合约校验服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，缺省时依次查找 config/orgair.toml、orgair.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .value_name("SECTOR_ID")
                .help("加载并校验单个行业配置，输出合约JSON后退出")
                .conflicts_with("validate-all"),
        )
        .arg(
            Arg::new("validate-all")
                .long("validate-all")
                .help("校验所有启用的行业配置后退出")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");

    // 加载配置
    let mut config = AppConfig::load(config_path.map(String::as_str)).with_context(|| {
        format!(
            "加载配置失败: {}",
            config_path.map(String::as_str).unwrap_or("默认路径")
        )
    })?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.observability.log_format = match format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
    }

    // 初始化日志系统
    init_logging(&config.observability.log_level, config.observability.log_format)?;

    info!(
        "启动 {} v{} ({})",
        config.app.name,
        config.app.version,
        config.app.environment.as_str()
    );
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }

    let app = Application::new(config).await?;

    if let Some(sector_id) = matches.get_one::<String>("validate") {
        let result = app.validate_sector(sector_id).await;
        app.close().await;
        let view = result?;
        println!(
            "{}",
            serde_json::to_string_pretty(&view).context("序列化合约失败")?
        );
        return Ok(());
    }

    if matches.get_flag("validate-all") {
        let result = app.validate_all().await;
        app.close().await;
        let report = result?;
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("序列化校验结果失败")?
        );
        if !report.is_ok() {
            anyhow::bail!(
                "{} 个行业缺失，{} 个行业违反合约",
                report.missing.len(),
                report.invalid.len()
            );
        }
        return Ok(());
    }

    // 创建优雅关闭管理器
    let shutdown_manager = ShutdownManager::new();

    let app = Arc::new(app);
    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);

        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {e:#}");
            }
        })
    };

    // 等待关闭信号
    wait_for_shutdown_signal().await?;

    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    if shutdown_manager.wait_for(app_handle, SHUTDOWN_TIMEOUT).await {
        info!("应用已优雅关闭");
    } else {
        warn!("应用关闭超时，强制退出");
    }

    app.close().await;
    info!("服务已退出");
    Ok(())
}

/// 初始化日志系统，`RUST_LOG` 优先于配置的级别
fn init_logging(log_level: &str, log_format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("初始化JSON日志格式失败")?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("初始化Pretty日志格式失败")?,
    }

    Ok(())
}

/// 等待 SIGINT 或 SIGTERM
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("安装SIGTERM信号处理器失败")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("安装Ctrl+C信号处理器失败")?;
                info!("收到Ctrl+C信号");
            },
            _ = terminate.recv() => {
                info!("收到SIGTERM信号");
            },
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.context("安装Ctrl+C信号处理器失败")?;
        info!("收到Ctrl+C信号");
    }

    Ok(())
}
