//! Two Hundred 主程序入口
//!
//! 终端URL状态监视工具

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::Term;
use std::io;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use two_hundred::cli::{Args, LogLevel, Prompt};
use two_hundred::config::{validate_config, Config, TomlConfigLoader};
use two_hundred::display::{LiveView, TermSink};
use two_hundred::health::{BatchChecker, CheckTarget, HttpStatusChecker};
use two_hundred::logging::{get_default_log_path, LogConfig, LoggingSystem};
use two_hundred::schedule::{PollInterval, RefreshCoordinator};
use two_hundred::TwoHundredError;

/// 内置使用手册
const MANUAL: &str = include_str!("../README.md");

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    if args.man {
        println!("{}", MANUAL);
        return Ok(());
    }

    // 日志系统依赖配置中的级别，加载配置之前的错误直接输出到标准错误
    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    // 初始化日志系统
    let level = LogLevel::from_str(&config.global.log_level, true)
        .map_err(anyhow::Error::msg)
        .context("无效的日志级别")?;
    let log_config = LogConfig {
        level: level.into(),
        file_path: Some(args.log_file.clone().unwrap_or_else(get_default_log_path)),
        json_format: config.global.json_logs(),
    };
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Two Hundred v{} 启动", two_hundred::VERSION);

    if let Err(e) = run(&args, config).await {
        error!("运行失败: {:#}", e);
        eprintln!("{:#}", e);
        std::process::exit(1);
    }

    info!("Two Hundred 已退出");
    Ok(())
}

/// 加载配置文件并应用命令行覆盖
async fn load_config(args: &Args) -> Result<Config> {
    let loader = TomlConfigLoader::default();
    let mut config = loader
        .load_or_default(args.config.as_deref())
        .await
        .context("加载配置失败")?;

    args.apply_to(&mut config);
    validate_config(&config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("配置验证失败")?;

    Ok(config)
}

/// 收集目标、执行首次检测并运行实时视图直到收到退出信号
async fn run(args: &Args, mut config: Config) -> Result<()> {
    let (targets, interval) = resolve_targets(args, &config).await?;
    config.global.poll_interval_minutes = interval.minutes();

    let checker = HttpStatusChecker::new(config.global.request_timeout())
        .context("创建HTTP客户端失败")?;
    let batch = BatchChecker::new(Arc::new(checker), config.global.max_concurrent_checks);

    let term = Term::stdout();
    term.write_line(&format!("Checking {} url(s)...", targets.len()))?;

    let coordinator = RefreshCoordinator::start(batch, targets, config.global.refresh_settings())
        .await
        .context("首次检测失败")?;
    let coordinator = Arc::new(coordinator);

    term.clear_screen()?;
    term.hide_cursor()?;
    let view = LiveView::start(Arc::clone(&coordinator), TermSink::new(term.clone()));

    let signal_result = signal::ctrl_c().await;
    info!("收到退出信号，正在停止");

    coordinator.shutdown().await;
    view.join().await;
    term.show_cursor()?;

    signal_result.context("监听退出信号失败")
}

/// 确定检测目标和轮询间隔
///
/// 命令行或配置文件给出了目标时直接使用，否则交互式输入
async fn resolve_targets(args: &Args, config: &Config) -> Result<(Vec<CheckTarget>, PollInterval)> {
    if !config.targets.is_empty() {
        let targets = config.parsed_targets().map_err(TwoHundredError::from)?;
        return Ok((targets, config.global.poll_interval()));
    }

    let ask_interval = !args.has_interval();
    let default_interval = config.global.poll_interval();

    let (targets, interval) = tokio::task::spawn_blocking(move || -> io::Result<_> {
        let stdin = io::stdin();
        let mut prompt = Prompt::new(stdin.lock(), io::stdout());
        let targets = prompt.collect_targets()?;
        let interval = if ask_interval && !targets.is_empty() {
            prompt.select_interval()?
        } else {
            default_interval
        };
        Ok((targets, interval))
    })
    .await
    .context("交互输入任务异常退出")??;

    if targets.is_empty() {
        return Err(TwoHundredError::from(two_hundred::error::TargetError::Empty).into());
    }

    Ok((targets, interval))
}
