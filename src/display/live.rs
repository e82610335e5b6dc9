//! 实时视图
//!
//! 在自己的周期任务上按tick节奏读取快照并重绘，不参与调度状态的修改

use crate::display::table::render;
use crate::schedule::{RecurringTask, RefreshCoordinator};
use console::Term;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 画面输出目标
pub trait FrameSink: Send + Sync + 'static {
    /// 用新的画面替换上一次的画面
    fn draw(&self, frame: &str) -> std::io::Result<()>;
}

/// 终端输出，重绘时擦除上一帧占用的行
#[derive(Debug)]
pub struct TermSink {
    term: Term,
    drawn_lines: AtomicUsize,
}

impl TermSink {
    /// 创建终端输出
    pub fn new(term: Term) -> Self {
        Self {
            term,
            drawn_lines: AtomicUsize::new(0),
        }
    }
}

impl FrameSink for TermSink {
    fn draw(&self, frame: &str) -> std::io::Result<()> {
        let previous = self
            .drawn_lines
            .swap(frame.lines().count(), Ordering::SeqCst);
        if previous > 0 {
            self.term.clear_last_lines(previous)?;
        }
        self.term.write_str(frame)?;
        self.term.flush()
    }
}

/// 重绘失败状态，连续失败只记录第一次
#[derive(Debug, Default)]
struct DrawHealth {
    failing: AtomicBool,
}

impl DrawHealth {
    /// 记录一次失败，返回是否为连续失败中的第一次
    fn mark_failed(&self) -> bool {
        !self.failing.swap(true, Ordering::SeqCst)
    }

    /// 记录一次成功，返回是否从失败中恢复
    fn mark_ok(&self) -> bool {
        self.failing.swap(false, Ordering::SeqCst)
    }
}

/// 实时视图句柄
#[derive(Debug)]
pub struct LiveView {
    task: RecurringTask,
}

impl LiveView {
    /// 启动实时视图
    ///
    /// 视图任务挂在协调器的关闭令牌下，协调器关闭时自动停止。
    /// 输出管道关闭时视图自行停止，协调器继续运行。
    ///
    /// # 参数
    /// * `coordinator` - 刷新协调器
    /// * `sink` - 画面输出目标
    pub fn start<S: FrameSink>(coordinator: Arc<RefreshCoordinator>, sink: S) -> Self {
        let interval = coordinator.settings().tick_interval;
        let view_token = coordinator.shutdown_token().child_token();
        let sink = Arc::new(sink);
        let health = Arc::new(DrawHealth::default());

        let task = RecurringTask::start_with_token(
            "live-view",
            interval,
            view_token.clone(),
            move || {
                let coordinator = Arc::clone(&coordinator);
                let sink = Arc::clone(&sink);
                let health = Arc::clone(&health);
                let view_token = view_token.clone();
                async move {
                    let frame = render(&coordinator.current_snapshot().await);
                    match sink.draw(&frame) {
                        Ok(()) => {
                            if health.mark_ok() {
                                info!("画面重绘已恢复");
                            }
                        }
                        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                            warn!(error = %e, "输出已关闭，停止实时视图");
                            view_token.cancel();
                        }
                        Err(e) => {
                            if health.mark_failed() {
                                warn!(error = %e, "画面重绘失败");
                            }
                        }
                    }
                    Ok(())
                }
            },
        );

        Self { task }
    }

    /// 停止视图并等待最后一次重绘结束
    pub async fn stop(self) {
        self.task.stop().await;
    }

    /// 等待视图随协调器关闭而结束
    pub async fn join(self) {
        self.task.join().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{BatchChecker, CheckOutcome, CheckResult, CheckTarget, StatusChecker};
    use crate::schedule::RefreshSettings;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    struct AlwaysOk;

    #[async_trait]
    impl StatusChecker for AlwaysOk {
        async fn check(&self, target: &CheckTarget) -> CheckResult {
            CheckResult::new(target.clone(), CheckOutcome::Status(200))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<String>>>,
    }

    impl FrameSink for RecordingSink {
        fn draw(&self, frame: &str) -> std::io::Result<()> {
            self.frames.lock().unwrap().push(frame.to_string());
            Ok(())
        }
    }

    async fn coordinator() -> Arc<RefreshCoordinator> {
        let coordinator = RefreshCoordinator::start(
            BatchChecker::new(Arc::new(AlwaysOk), 4),
            vec![CheckTarget::parse("https://example.com").unwrap()],
            RefreshSettings::default(),
        )
        .await
        .unwrap();
        Arc::new(coordinator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_redraws_on_tick_cadence() {
        let coordinator = coordinator().await;
        let sink = RecordingSink::default();
        let view = LiveView::start(Arc::clone(&coordinator), sink.clone());

        sleep(Duration::from_millis(350)).await;
        view.stop().await;

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames
            .iter()
            .all(|frame| console::strip_ansi_codes(frame).contains("https://example.com")));
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_with_coordinator() {
        let coordinator = coordinator().await;
        let sink = RecordingSink::default();
        let view = LiveView::start(Arc::clone(&coordinator), sink.clone());

        sleep(Duration::from_millis(250)).await;
        coordinator.shutdown().await;
        view.join().await;

        let drawn = sink.frames.lock().unwrap().len();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.frames.lock().unwrap().len(), drawn);
    }

    /// 按指定错误类型失败并统计调用次数的输出
    #[derive(Clone)]
    struct FailingSink {
        kind: ErrorKind,
        draws: Arc<AtomicUsize>,
    }

    impl FailingSink {
        fn new(kind: ErrorKind) -> Self {
            Self {
                kind,
                draws: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl FrameSink for FailingSink {
        fn draw(&self, _frame: &str) -> std::io::Result<()> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            Err(std::io::Error::new(self.kind, "draw failed"))
        }
    }

    #[test]
    fn test_draw_health_reports_first_failure_only() {
        let health = DrawHealth::default();
        assert!(!health.mark_ok());
        assert!(health.mark_failed());
        assert!(!health.mark_failed());
        assert!(!health.mark_failed());
        assert!(health.mark_ok());
        assert!(health.mark_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_redrawing_after_draw_errors() {
        let coordinator = coordinator().await;
        let sink = FailingSink::new(ErrorKind::Other);
        let view = LiveView::start(Arc::clone(&coordinator), sink.clone());

        sleep(Duration::from_millis(350)).await;
        view.stop().await;

        assert_eq!(sink.draws.load(Ordering::SeqCst), 4);
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_pipe_stops_view_only() {
        let coordinator = coordinator().await;
        let sink = FailingSink::new(ErrorKind::BrokenPipe);
        let view = LiveView::start(Arc::clone(&coordinator), sink.clone());

        view.join().await;
        sleep(Duration::from_millis(500)).await;

        assert_eq!(sink.draws.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_shut_down());
        coordinator.shutdown().await;
    }
}
