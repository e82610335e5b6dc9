//! 刷新协调器
//!
//! 持有快速的tick任务，在倒计时归零时在后台启动一次批量检测。
//! 同一时刻最多只有一次轮询在进行；轮询结果整体替换，展示层不会看到部分结果。

use crate::error::{Result, TwoHundredError};
use crate::health::{BatchChecker, CheckTarget, PollCycle};
use crate::schedule::interval::PollInterval;
use crate::schedule::recurring::RecurringTask;
use crate::schedule::state::{ScheduleState, Snapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 默认tick间隔
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// 刷新节奏配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// 两次轮询之间的间隔
    pub poll_interval: Duration,
    /// tick间隔
    pub tick_interval: Duration,
}

impl RefreshSettings {
    /// 由用户选择的轮询间隔创建配置
    pub fn new(poll_interval: PollInterval, tick_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.as_duration(),
            tick_interval,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::new(PollInterval::default(), DEFAULT_TICK_INTERVAL)
    }
}

/// 锁内的可变状态
struct CoordinatorState {
    cycle: Arc<PollCycle>,
    schedule: ScheduleState,
}

/// tick任务和轮询任务共享的部分
struct Shared {
    batch: BatchChecker,
    targets: Arc<[CheckTarget]>,
    settings: RefreshSettings,
    state: RwLock<CoordinatorState>,
    shutdown: CancellationToken,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// 处理一次tick
    ///
    /// 只修改调度状态，需要轮询时启动后台任务，不等待网络请求
    async fn on_tick(self: &Arc<Self>) {
        let should_poll = {
            let mut state = self.state.write().await;
            if self.shutdown.is_cancelled() {
                return;
            }

            let schedule = &mut state.schedule;
            schedule.tick_count += 1;

            if schedule.updating {
                false
            } else {
                schedule.countdown_remaining = schedule
                    .countdown_remaining
                    .saturating_sub(self.settings.tick_interval);
                if schedule.countdown_remaining.is_zero() {
                    schedule.updating = true;
                    true
                } else {
                    false
                }
            }
        };

        if should_poll {
            self.launch_poll().await;
        }
    }

    /// 在后台启动一次轮询
    async fn launch_poll(self: &Arc<Self>) {
        debug!("倒计时结束，开始轮询");
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let cycle = tokio::select! {
                _ = shared.shutdown.cancelled() => {
                    debug!("协调器已关闭，放弃进行中的轮询");
                    return;
                }
                cycle = shared.batch.check_all(&shared.targets) => cycle,
            };
            shared.commit(cycle).await;
        });

        let mut poll_task = self.poll_task.lock().await;
        *poll_task = Some(handle);
    }

    /// 提交轮询结果，协调器关闭后不再提交
    async fn commit(&self, cycle: PollCycle) -> bool {
        let mut state = self.state.write().await;
        if self.shutdown.is_cancelled() {
            debug!(cycle_id = %cycle.id, "协调器已关闭，丢弃轮询结果");
            return false;
        }

        crate::logging::log_poll_cycle(&cycle);

        state.cycle = Arc::new(cycle);
        state.schedule.updating = false;
        state.schedule.countdown_remaining = self.settings.poll_interval;
        state.schedule.cycles_committed += 1;
        true
    }
}

/// 刷新协调器
pub struct RefreshCoordinator {
    shared: Arc<Shared>,
    tick: Mutex<Option<RecurringTask>>,
}

impl RefreshCoordinator {
    /// 执行首次检测并启动tick任务
    ///
    /// 首次检测在启动任何定时器之前同步完成，保证第一次渲染就有真实数据。
    /// 如果所有目标在首次检测中都无法访问，返回启动错误。
    ///
    /// # 参数
    /// * `batch` - 批量检测器
    /// * `targets` - 检测目标，启动后不再变化
    /// * `settings` - 刷新节奏
    ///
    /// # 返回
    /// * `Result<Self>` - 已运行的协调器
    pub async fn start(
        batch: BatchChecker,
        targets: Vec<CheckTarget>,
        settings: RefreshSettings,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(crate::error::TargetError::Empty.into());
        }

        info!(
            targets = targets.len(),
            poll_interval_secs = settings.poll_interval.as_secs(),
            "执行首次检测"
        );
        let initial = batch.check_all(&targets).await;
        if initial.all_failed() {
            return Err(TwoHundredError::Startup(format!(
                "首次检测中全部 {} 个目标都无法访问",
                initial.len()
            )));
        }

        let shared = Arc::new(Shared {
            batch,
            targets: targets.into(),
            settings,
            state: RwLock::new(CoordinatorState {
                cycle: Arc::new(initial),
                schedule: ScheduleState::new(settings.poll_interval),
            }),
            shutdown: CancellationToken::new(),
            poll_task: Mutex::new(None),
        });

        let tick_shared = Arc::clone(&shared);
        let tick = RecurringTask::start_with_token(
            "refresh-tick",
            settings.tick_interval,
            shared.shutdown.clone(),
            move || {
                let shared = Arc::clone(&tick_shared);
                async move {
                    shared.on_tick().await;
                    Ok(())
                }
            },
        );

        Ok(Self {
            shared,
            tick: Mutex::new(Some(tick)),
        })
    }

    /// 读取当前快照
    ///
    /// 总是返回最近一次完整提交的轮询结果和对应的调度状态
    pub async fn current_snapshot(&self) -> Snapshot {
        let state = self.shared.state.read().await;
        Snapshot {
            cycle: Arc::clone(&state.cycle),
            schedule: state.schedule,
        }
    }

    /// 检测目标
    pub fn targets(&self) -> &[CheckTarget] {
        &self.shared.targets
    }

    /// 刷新节奏
    pub fn settings(&self) -> RefreshSettings {
        self.shared.settings
    }

    /// 协调器的关闭令牌，父令牌可用于联动其他周期任务
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// 是否已关闭
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// 停止tick任务并取消进行中的轮询
    ///
    /// 返回后不会再有任何轮询结果被提交
    pub async fn shutdown(&self) {
        {
            // 在写锁内取消，保证之后的 commit 一定能看到取消状态
            let _state = self.shared.state.write().await;
            self.shared.shutdown.cancel();
        }

        if let Some(tick) = self.tick.lock().await.take() {
            tick.stop().await;
        }

        if let Some(poll) = self.shared.poll_task.lock().await.take() {
            if let Err(e) = poll.await {
                warn!("轮询任务异常退出: {}", e);
            }
        }

        info!("刷新协调器已停止");
    }
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}
