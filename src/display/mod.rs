//! 展示模块
//!
//! 提供状态表格渲染和实时刷新视图

pub mod color;
pub mod live;
pub mod table;

// 重新导出主要类型
pub use color::status_style;
pub use live::{FrameSink, LiveView, TermSink};
pub use table::{countdown_line, render};
