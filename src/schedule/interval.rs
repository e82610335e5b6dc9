//! 轮询间隔
//!
//! 用户只能从固定的几个分钟数中选择

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 可选的轮询间隔（分钟）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum PollInterval {
    /// 1 分钟
    #[default]
    OneMinute,
    /// 5 分钟
    FiveMinutes,
    /// 10 分钟
    TenMinutes,
    /// 15 分钟
    FifteenMinutes,
    /// 30 分钟
    ThirtyMinutes,
}

impl PollInterval {
    /// 全部可选值，按从短到长排列
    pub const ALL: [PollInterval; 5] = [
        PollInterval::OneMinute,
        PollInterval::FiveMinutes,
        PollInterval::TenMinutes,
        PollInterval::FifteenMinutes,
        PollInterval::ThirtyMinutes,
    ];

    /// 分钟数
    pub fn minutes(&self) -> u64 {
        match self {
            PollInterval::OneMinute => 1,
            PollInterval::FiveMinutes => 5,
            PollInterval::TenMinutes => 10,
            PollInterval::FifteenMinutes => 15,
            PollInterval::ThirtyMinutes => 30,
        }
    }

    /// 秒数
    pub fn seconds(&self) -> u64 {
        self.minutes() * 60
    }

    /// 转换为 Duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// 由分钟数查找轮询间隔
    pub fn from_minutes(minutes: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.minutes() == minutes)
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes() {
            1 => write!(f, "1 minute"),
            n => write!(f, "{n} minutes"),
        }
    }
}

/// 非法轮询间隔
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("无效的轮询间隔: {0}，可选值为 1, 5, 10, 15, 30（分钟）")]
pub struct InvalidPollInterval(pub String);

impl FromStr for PollInterval {
    type Err = InvalidPollInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::from_minutes)
            .ok_or_else(|| InvalidPollInterval(s.trim().to_string()))
    }
}

impl TryFrom<u64> for PollInterval {
    type Error = InvalidPollInterval;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| InvalidPollInterval(minutes.to_string()))
    }
}

impl From<PollInterval> for u64 {
    fn from(interval: PollInterval) -> Self {
        interval.minutes()
    }
}
