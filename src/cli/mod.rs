//! 命令行接口模块
//!
//! 提供CLI参数解析和交互式输入功能

pub mod args;
pub mod prompt;

// 重新导出主要类型
pub use args::{Args, LogLevel};
pub use prompt::Prompt;
