//! 调度状态
//!
//! 展示层需要的倒计时、转圈帧等都由 `ScheduleState` 纯计算得到

use crate::health::PollCycle;
use std::sync::Arc;
use std::time::Duration;

/// 转圈动画帧
pub const SPINNER_FRAMES: [char; 4] = ['-', '\\', '|', '/'];

/// 轮询阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// 等待下一次轮询
    Idle,
    /// 正在轮询
    Polling,
}

/// 调度状态，只由 `RefreshCoordinator` 修改
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    /// 距离下一次轮询的剩余时间
    pub countdown_remaining: Duration,
    /// 是否有轮询正在进行
    pub updating: bool,
    /// 已执行的tick次数
    pub tick_count: u64,
    /// 已提交的轮询次数（不含启动时的首次检测）
    pub cycles_committed: u64,
}

impl ScheduleState {
    /// 以完整的轮询间隔开始倒计时
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            countdown_remaining: poll_interval,
            updating: false,
            tick_count: 0,
            cycles_committed: 0,
        }
    }

    /// 当前轮询阶段
    pub fn phase(&self) -> PollPhase {
        if self.updating {
            PollPhase::Polling
        } else {
            PollPhase::Idle
        }
    }

    /// 当前转圈帧
    pub fn spinner_frame(&self) -> char {
        SPINNER_FRAMES[(self.tick_count % SPINNER_FRAMES.len() as u64) as usize]
    }

    /// 倒计时拆分为（分钟, 秒），不足一秒向上取整
    pub fn countdown_parts(&self) -> (u64, u64) {
        let millis = self.countdown_remaining.as_millis() as u64;
        let seconds = millis.div_ceil(1000);
        (seconds / 60, seconds % 60)
    }
}

/// 展示层读取的完整快照
///
/// 轮询结果和调度状态在同一把锁下读取，不会出现新旧混合
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 最近一次完整提交的轮询
    pub cycle: Arc<PollCycle>,
    /// 调度状态
    pub schedule: ScheduleState,
}
