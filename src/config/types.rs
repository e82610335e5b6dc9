//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::error::TargetError;
use crate::health::{parse_targets, CheckTarget};
use crate::schedule::{PollInterval, RefreshSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构，包含全局配置和检测目标
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 检测目标URL列表，为空时在启动后交互式输入
    #[serde(default)]
    pub targets: Vec<String>,
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 轮询间隔（分钟），只能是 1, 5, 10, 15, 30
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 界面刷新间隔（毫秒）
    #[serde(default = "default_tick_interval")]
    pub tick_interval_millis: u64,
    /// 最大并发检测数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志格式：text 或 json
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: default_poll_interval(),
            request_timeout_seconds: default_timeout(),
            tick_interval_millis: default_tick_interval(),
            max_concurrent_checks: default_max_concurrent(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// 默认值函数
fn default_poll_interval() -> u64 {
    1
}
fn default_timeout() -> u64 {
    10
}
fn default_tick_interval() -> u64 {
    100
}
fn default_max_concurrent() -> usize {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl GlobalConfig {
    /// 轮询间隔，非法值回退到默认值（配置加载时已校验）
    pub fn poll_interval(&self) -> PollInterval {
        PollInterval::from_minutes(self.poll_interval_minutes).unwrap_or_default()
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// 刷新节奏
    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings::new(
            self.poll_interval(),
            Duration::from_millis(self.tick_interval_millis),
        )
    }

    /// 是否输出JSON格式日志
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

impl Config {
    /// 解析配置中的检测目标，没有目标时返回 `TargetError::Empty`
    pub fn parsed_targets(&self) -> Result<Vec<CheckTarget>, TargetError> {
        parse_targets(&self.targets)
    }
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    let global = &config.global;

    if PollInterval::from_minutes(global.poll_interval_minutes).is_none() {
        return Err(format!(
            "无效的轮询间隔: {} 分钟，支持的间隔: 1, 5, 10, 15, 30",
            global.poll_interval_minutes
        ));
    }

    if global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if global.tick_interval_millis == 0 {
        return Err("界面刷新间隔不能为0".to_string());
    }

    if global.tick_interval_millis > global.poll_interval_minutes * 60 * 1000 {
        return Err("界面刷新间隔不能超过轮询间隔".to_string());
    }

    if global.max_concurrent_checks == 0 {
        return Err("最大并发检测数不能为0".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            global.log_level, valid_log_levels
        ));
    }

    let valid_log_formats = ["text", "json"];
    if !valid_log_formats.contains(&global.log_format.as_str()) {
        return Err(format!(
            "无效的日志格式: {}，支持的格式: {:?}",
            global.log_format, valid_log_formats
        ));
    }

    // 验证检测目标
    for target in &config.targets {
        CheckTarget::parse(target).map_err(|e| e.to_string())?;
    }

    Ok(())
}
