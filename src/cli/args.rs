//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::Config;
use crate::schedule::PollInterval;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Two Hundred - 终端URL状态监视工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "two-hundred",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 打印使用手册并退出
    #[arg(short, long, help = "打印使用手册并退出")]
    pub man: bool,

    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "TWO_HUNDRED_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 检测目标，可重复指定；指定后跳过交互输入
    #[arg(
        short,
        long = "url",
        value_name = "URL",
        help = "检测目标URL，可重复指定"
    )]
    pub urls: Vec<String>,

    /// 轮询间隔（分钟）
    #[arg(
        short,
        long,
        value_name = "MINUTES",
        help = "轮询间隔（分钟）：1, 5, 10, 15, 30"
    )]
    pub interval: Option<PollInterval>,

    /// 单次请求超时（秒）
    #[arg(short, long, value_name = "SECONDS", help = "单次请求超时（秒）")]
    pub timeout: Option<u64>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "TWO_HUNDRED_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 日志文件路径
    #[arg(long, value_name = "FILE", help = "日志文件路径")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// 用命令行参数覆盖配置文件中的值
    ///
    /// # 参数
    /// * `config` - 从文件加载的配置
    pub fn apply_to(&self, config: &mut Config) {
        if !self.urls.is_empty() {
            config.targets = self.urls.clone();
        }
        if let Some(interval) = self.interval {
            config.global.poll_interval_minutes = interval.minutes();
        }
        if let Some(timeout) = self.timeout {
            config.global.request_timeout_seconds = timeout;
        }
        if let Some(level) = &self.log_level {
            config.global.log_level = level.to_string();
        }
    }

    /// 是否已在命令行中给出了轮询间隔
    pub fn has_interval(&self) -> bool {
        self.interval.is_some()
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

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_repeated_urls() {
        let args = Args::try_parse_from([
            "two-hundred",
            "-u",
            "https://example.com",
            "--url",
            "https://example.com/missing",
            "-i",
            "5",
        ])
        .unwrap();

        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.interval, Some(PollInterval::FiveMinutes));
        assert!(!args.man);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let result = Args::try_parse_from(["two-hundred", "--interval", "7"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_man_flag() {
        let args = Args::try_parse_from(["two-hundred", "-m"]).unwrap();
        assert!(args.man);
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = Args::try_parse_from([
            "two-hundred",
            "-u",
            "https://override.example",
            "-t",
            "3",
            "-l",
            "debug",
        ])
        .unwrap();

        let mut config = Config {
            targets: vec!["https://file.example".to_string()],
            ..Config::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.targets, vec!["https://override.example"]);
        assert_eq!(config.global.request_timeout_seconds, 3);
        assert_eq!(config.global.log_level, "debug");
        // 未指定的保持原值
        assert_eq!(config.global.poll_interval_minutes, 1);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(
            <LogLevel as ValueEnum>::from_str("error", true),
            Ok(LogLevel::Error)
        );
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
