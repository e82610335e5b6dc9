//! Two Hundred - 终端URL状态监视工具
//!
//! 这是一个用Rust编写的终端工具，定期检测一组URL的HTTP状态并实时刷新表格，支持：
//! - 并发HTTP/HTTPS状态检测
//! - 可选的轮询间隔（1、5、10、15、30分钟）
//! - 独立于网络请求的界面刷新节奏
//! - TOML配置文件
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod health;
pub mod logging;
pub mod schedule;

// 重新导出主要类型
pub use config::{Config, GlobalConfig};
pub use error::TwoHundredError;
pub use health::{
    BatchChecker, CheckOutcome, CheckResult, CheckTarget, HttpStatusChecker, PollCycle,
    StatusChecker,
};
pub use schedule::{PollInterval, RecurringTask, RefreshCoordinator, RefreshSettings, Snapshot};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
