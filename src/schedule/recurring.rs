//! 自调度周期任务
//!
//! 每次回调执行完毕后再等待固定延迟，然后开始下一次执行。
//! 延迟从上一次回调结束开始计算，因此同一个任务的回调永远不会重叠。

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 周期任务句柄
///
/// 丢弃句柄会取消任务；正在执行的回调会继续完成，但不会再调度下一次
pub struct RecurringTask {
    /// 任务名称
    name: String,
    /// 取消令牌
    cancel: CancellationToken,
    /// 后台任务句柄
    handle: Option<JoinHandle<()>>,
}

impl RecurringTask {
    /// 启动周期任务
    ///
    /// 回调会立即执行第一次，之后每次在上一次结束后等待 `delay` 再执行。
    /// 回调返回错误或发生panic时只记录日志，任务继续调度。
    ///
    /// # 参数
    /// * `name` - 任务名称，用于日志
    /// * `delay` - 两次执行之间的间隔
    /// * `callback` - 每次执行的回调
    ///
    /// # 返回
    /// * `Self` - 任务句柄
    pub fn start<F, Fut>(name: impl Into<String>, delay: Duration, callback: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::start_with_token(name, delay, CancellationToken::new(), callback)
    }

    /// 使用外部取消令牌启动周期任务
    ///
    /// 任务持有 `parent` 的子令牌：父令牌取消时任务随之停止，单独取消任务不会影响父令牌
    pub fn start_with_token<F, Fut>(
        name: impl Into<String>,
        delay: Duration,
        parent: CancellationToken,
        mut callback: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let cancel = parent.child_token();
        let token = cancel.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            debug!(task = %task_name, delay_ms = delay.as_millis() as u64, "周期任务已启动");

            loop {
                // 同步panic也在 catch_unwind 范围内
                let run = async { callback().await };
                match AssertUnwindSafe(run).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(task = %task_name, error = %e, "周期任务执行失败，继续调度");
                    }
                    Err(panic) => {
                        error!(
                            task = %task_name,
                            "周期任务发生panic，继续调度: {}",
                            panic_message(panic.as_ref())
                        );
                    }
                }

                if token.is_cancelled() {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            debug!(task = %task_name, "周期任务已停止");
        });

        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    /// 任务名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 取消任务，不再调度后续执行
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 取消任务并等待正在执行的回调结束
    pub async fn stop(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// 等待任务结束，不主动取消
    ///
    /// 只有在任务或其父令牌被取消后才会返回
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(task = %self.name, "周期任务异常退出: {}", e);
                }
            }
        }
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for RecurringTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecurringTask")
            .field("name", &self.name)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::{sleep, Instant};

    #[derive(Default)]
    struct Timeline {
        starts: Vec<Instant>,
        ends: Vec<Instant>,
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_measured_from_end_of_callback() {
        let timeline = Arc::new(Mutex::new(Timeline::default()));
        let delay = Duration::from_millis(100);
        let work = Duration::from_millis(250);

        let recorder = Arc::clone(&timeline);
        let task = RecurringTask::start("timeline", delay, move || {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().unwrap().starts.push(Instant::now());
                sleep(work).await;
                recorder.lock().unwrap().ends.push(Instant::now());
                Ok(())
            }
        });

        sleep(Duration::from_millis(1_500)).await;
        task.stop().await;

        let timeline = timeline.lock().unwrap();
        assert!(timeline.starts.len() >= 4);
        for k in 0..timeline.ends.len().min(timeline.starts.len() - 1) {
            let gap = timeline.starts[k + 1] - timeline.ends[k];
            assert!(gap >= delay, "gap {gap:?} shorter than delay");
            assert!(gap < delay + Duration::from_millis(5), "gap {gap:?} drifted");
        }
        // 开始时间间隔 = 执行时间 + 延迟
        let period = timeline.starts[1] - timeline.starts[0];
        assert!(period >= work + delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_never_overlaps() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let (flag, overlap_counter) = (Arc::clone(&in_flight), Arc::clone(&overlaps));
        let task = RecurringTask::start("overlap", Duration::from_millis(10), move || {
            let flag = Arc::clone(&flag);
            let overlap_counter = Arc::clone(&overlap_counter);
            async move {
                if flag.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlap_counter.fetch_add(1, Ordering::SeqCst);
                }
                sleep(Duration::from_millis(100)).await;
                flag.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });

        sleep(Duration::from_secs(2)).await;
        task.stop().await;
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_rescheduling() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let task = RecurringTask::start("flaky", Duration::from_millis(100), move || {
            let counter = Arc::clone(&counter);
            async move {
                let run = counter.fetch_add(1, Ordering::SeqCst);
                if run % 2 == 0 {
                    anyhow::bail!("transient failure #{run}");
                }
                Ok(())
            }
        });

        sleep(Duration::from_millis(950)).await;
        task.stop().await;
        assert!(runs.load(Ordering::SeqCst) >= 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panics_do_not_stop_rescheduling() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let task = RecurringTask::start("panicky", Duration::from_millis(100), move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if run == 0 {
                    panic!("first run blows up");
                }
                Ok(())
            }
        });

        sleep(Duration::from_millis(450)).await;
        task.stop().await;
        assert!(runs.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_lets_in_flight_callback_finish() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let (s, f) = (Arc::clone(&started), Arc::clone(&finished));
        let task = RecurringTask::start("cancellable", Duration::from_millis(10), move || {
            let (s, f) = (Arc::clone(&s), Arc::clone(&f));
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(200)).await;
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        sleep(Duration::from_millis(50)).await;
        task.cancel();
        assert!(task.is_cancelled());
        task.stop().await;

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_token_cancels_task() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let parent = CancellationToken::new();

        let task = RecurringTask::start_with_token(
            "child",
            Duration::from_millis(100),
            parent.clone(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        );

        sleep(Duration::from_millis(250)).await;
        parent.cancel();
        assert!(task.is_cancelled());
        task.join().await;

        let after_cancel = runs.load(Ordering::SeqCst);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_tasks_keep_their_own_cadence() {
        let fast_runs = Arc::new(AtomicUsize::new(0));
        let slow_runs = Arc::new(AtomicUsize::new(0));

        let fast_counter = Arc::clone(&fast_runs);
        let fast = RecurringTask::start("fast", Duration::from_millis(100), move || {
            fast_counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        let slow_counter = Arc::clone(&slow_runs);
        let slow = RecurringTask::start("slow", Duration::from_millis(500), move || {
            slow_counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        sleep(Duration::from_millis(1_050)).await;
        fast.stop().await;
        slow.stop().await;

        // 0,100,...,1000 共11次；0,500,1000 共3次
        assert_eq!(fast_runs.load(Ordering::SeqCst), 11);
        assert_eq!(slow_runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_drop_cancels_task() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let task = RecurringTask::start("dropped", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        assert_eq!(task.name(), "dropped");
        drop(task);

        sleep(Duration::from_millis(30)).await;
        let after_drop = runs.load(Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_drop);
    }
}
