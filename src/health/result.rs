//! 检测结果数据结构
//!
//! 定义单次检测的结果、失败标记以及一次轮询的不可变快照

use crate::health::target::CheckTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 传输层失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// 请求超时
    Timeout,
    /// 域名解析失败
    Dns,
    /// 连接失败
    Connect,
    /// TLS握手或证书错误
    Tls,
    /// 其他传输错误
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Dns => write!(f, "dns error"),
            FailureKind::Connect => write!(f, "connection failed"),
            FailureKind::Tls => write!(f, "tls error"),
            FailureKind::Other => write!(f, "request failed"),
        }
    }
}

/// 单次检测的结果：HTTP状态码或失败标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// 收到了HTTP响应（包括4xx/5xx）
    Status(u16),
    /// 传输层失败
    Failed(FailureKind),
}

impl CheckOutcome {
    /// 获取HTTP状态码（如果有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CheckOutcome::Status(code) => Some(*code),
            CheckOutcome::Failed(_) => None,
        }
    }

    /// 是否为传输层失败
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }

    /// 状态分级，用于展示着色
    pub fn band(&self) -> StatusBand {
        match self {
            CheckOutcome::Status(100..=199) => StatusBand::Informational,
            CheckOutcome::Status(200..=299) => StatusBand::Success,
            CheckOutcome::Status(400..=499) => StatusBand::ClientError,
            _ => StatusBand::ServerOrOther,
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOutcome::Status(code) => write!(f, "{code}"),
            CheckOutcome::Failed(kind) => write!(f, "{kind}"),
        }
    }
}

/// 状态分级
///
/// 3xx、5xx以及所有传输失败都归入 `ServerOrOther`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBand {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 4xx
    ClientError,
    /// 其余情况
    ServerOrOther,
}

/// 单个目标的检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// 检测目标
    pub target: CheckTarget,
    /// 检测结果
    pub outcome: CheckOutcome,
    /// 响应时间
    #[serde(with = "duration_serde")]
    pub response_time: Duration,
}

impl CheckResult {
    /// 创建新的检测结果
    pub fn new(target: CheckTarget, outcome: CheckOutcome) -> Self {
        Self {
            target,
            outcome,
            response_time: Duration::ZERO,
        }
    }

    /// 设置响应时间
    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }

    /// 获取响应时间（毫秒）
    pub fn response_time_ms(&self) -> u64 {
        self.response_time.as_millis() as u64
    }
}

/// 一次完整轮询的不可变快照
///
/// 只有在整批检测全部完成后才会被创建，调用方不会看到部分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollCycle {
    /// 轮询ID
    pub id: Uuid,
    /// 按输入顺序排列的检测结果
    pub results: Vec<CheckResult>,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 完成时间
    pub completed_at: DateTime<Utc>,
}

impl PollCycle {
    /// 由一批已完成的结果创建快照
    pub fn new(results: Vec<CheckResult>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            results,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// 结果数量
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// 是否没有结果
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 传输失败的目标数量
    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.is_failure())
            .count()
    }

    /// 是否所有目标都传输失败
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.failure_count() == self.results.len()
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Duration序列化模块
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
