//! 调度模块
//!
//! 提供自调度周期任务、轮询间隔以及驱动检测和刷新的协调器

pub mod coordinator;
pub mod interval;
pub mod recurring;
pub mod state;

// 重新导出主要类型
pub use coordinator::{RefreshCoordinator, RefreshSettings, DEFAULT_TICK_INTERVAL};
pub use interval::PollInterval;
pub use recurring::RecurringTask;
pub use state::{PollPhase, ScheduleState, Snapshot};
