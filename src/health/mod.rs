//! 状态检测模块
//!
//! 提供目标校验、单目标HTTP状态检测和批量并发检测功能

pub mod batch;
pub mod checker;
pub mod result;
pub mod target;

// 重新导出主要类型
pub use batch::BatchChecker;
pub use checker::{HttpStatusChecker, StatusChecker};
pub use result::{CheckOutcome, CheckResult, FailureKind, PollCycle, StatusBand};
pub use target::{parse_targets, CheckTarget};
