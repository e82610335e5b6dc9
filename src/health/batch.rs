//! 批量检测
//!
//! 对所有目标并发执行状态检测，等全部完成后按输入顺序生成一次轮询快照

use crate::health::checker::StatusChecker;
use crate::health::result::{CheckResult, PollCycle};
use crate::health::target::CheckTarget;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// 默认最大并发检测数
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 50;

/// 批量检测器
#[derive(Clone)]
pub struct BatchChecker {
    /// 单目标检测器
    checker: Arc<dyn StatusChecker>,
    /// 并发控制信号量
    semaphore: Arc<Semaphore>,
}

impl BatchChecker {
    /// 创建新的批量检测器
    ///
    /// # 参数
    /// * `checker` - 单目标检测器
    /// * `max_concurrent` - 同时进行的最大检测数，0 视为 1
    pub fn new(checker: Arc<dyn StatusChecker>, max_concurrent: usize) -> Self {
        Self {
            checker,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// 检测全部目标
    ///
    /// 不会因为某个目标失败而提前返回；结果顺序与 `targets` 一致，和完成先后无关
    ///
    /// # 参数
    /// * `targets` - 检测目标列表
    ///
    /// # 返回
    /// * `PollCycle` - 完整的轮询快照
    pub async fn check_all(&self, targets: &[CheckTarget]) -> PollCycle {
        let started_at = Utc::now();
        debug!("开始批量检测，目标数量: {}", targets.len());

        let futures = targets.iter().map(|target| self.check_one(target));
        // join_all 按输入顺序返回结果
        let results: Vec<CheckResult> = futures::future::join_all(futures).await;

        let cycle = PollCycle::new(results, started_at);
        debug!(
            cycle_id = %cycle.id,
            failures = cycle.failure_count(),
            "批量检测完成"
        );
        cycle
    }

    async fn check_one(&self, target: &CheckTarget) -> CheckResult {
        // 信号量从不关闭，获取失败时直接检测
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                warn!("获取并发许可失败，直接检测: {}", target);
                None
            }
        };
        self.checker.check(target).await
    }
}

impl std::fmt::Debug for BatchChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchChecker")
            .field("available_permits", &self.semaphore.available_permits())
            .finish()
    }
}
