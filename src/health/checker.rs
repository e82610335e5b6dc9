//! HTTP状态检测器实现
//!
//! 对单个目标发起一次带超时的GET请求，并把结果映射为状态码或失败标记

use crate::error::{CheckError, Result};
use crate::health::result::{CheckOutcome, CheckResult, FailureKind};
use crate::health::target::CheckTarget;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// 默认请求超时时间
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 状态检测器trait，定义检测接口
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// 检测单个目标
    ///
    /// 任何HTTP响应都是有效结果；传输层失败以失败标记返回，不会以错误形式抛给调用方
    ///
    /// # 参数
    /// * `target` - 检测目标
    ///
    /// # 返回
    /// * `CheckResult` - 检测结果
    async fn check(&self, target: &CheckTarget) -> CheckResult;
}

/// 基于reqwest的HTTP状态检测器
#[derive(Debug, Clone)]
pub struct HttpStatusChecker {
    /// HTTP客户端
    client: Client,
    /// 单次请求超时时间
    request_timeout: Duration,
}

impl HttpStatusChecker {
    /// 创建新的HTTP状态检测器
    ///
    /// # 参数
    /// * `request_timeout` - 单次请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 检测器实例
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(CheckError::ClientBuild)?;

        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// 单次请求超时时间
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// 把reqwest错误归类为失败标记
    fn classify_error(error: &reqwest::Error) -> FailureKind {
        if error.is_timeout() {
            return FailureKind::Timeout;
        }

        // reqwest不区分DNS和TLS错误，只能从底层错误链的描述中判断
        let chain = source_chain_text(error);
        if chain.contains("dns")
            || chain.contains("failed to lookup")
            || chain.contains("resolve")
            || chain.contains("name or service not known")
        {
            FailureKind::Dns
        } else if chain.contains("certificate")
            || chain.contains("tls")
            || chain.contains("ssl")
            || has_invalid_data(error)
        {
            FailureKind::Tls
        } else if error.is_connect() {
            FailureKind::Connect
        } else {
            FailureKind::Other
        }
    }
}

/// 把错误的所有来源拼接为小写文本
///
/// 不包含最外层描述，因为其中带有请求URL
fn source_chain_text(error: &(dyn StdError + 'static)) -> String {
    let mut text = String::new();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(&inner.to_string());
        text.push_str(": ");
        source = inner.source();
    }
    text.to_lowercase()
}

/// 错误链中是否有 `InvalidData` 类的IO错误
///
/// rustls 握手收到非TLS数据时以这种IO错误返回
fn has_invalid_data(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(inner) = source {
        if let Some(io_error) = inner.downcast_ref::<std::io::Error>() {
            if io_error.kind() == std::io::ErrorKind::InvalidData {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

#[async_trait]
impl StatusChecker for HttpStatusChecker {
    async fn check(&self, target: &CheckTarget) -> CheckResult {
        let start_time = Instant::now();

        // 客户端本身带超时，这里再套一层保证整个请求有上限
        let response_result = timeout(
            self.request_timeout,
            self.client.get(target.url().clone()).send(),
        )
        .await;

        let response_time = start_time.elapsed();

        let outcome = match response_result {
            Ok(Ok(response)) => CheckOutcome::Status(response.status().as_u16()),
            Ok(Err(e)) => {
                let kind = Self::classify_error(&e);
                debug!(target_url = %target, error = %e, "请求失败: {}", kind);
                CheckOutcome::Failed(kind)
            }
            Err(_) => CheckOutcome::Failed(FailureKind::Timeout),
        };

        CheckResult::new(target.clone(), outcome).with_response_time(response_time)
    }
}
