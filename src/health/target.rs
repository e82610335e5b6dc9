//! 检测目标
//!
//! 用户输入的URL在这里完成校验，之后在整个进程生命周期内保持不变

use crate::error::TargetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// 结束输入的哨兵值
pub const SENTINEL: &str = "done";

/// 经过校验的检测目标
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckTarget {
    url: Url,
    /// 用户输入的原始字符串，用于展示
    raw: String,
}

impl CheckTarget {
    /// 解析并校验检测目标
    ///
    /// # 参数
    /// * `input` - 用户输入的URL
    ///
    /// # 返回
    /// * `Result<Self, TargetError>` - 合法的绝对 http/https URL，或校验错误
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();

        if trimmed == SENTINEL {
            return Err(TargetError::Sentinel(trimmed.to_string()));
        }

        let url = Url::parse(trimmed).map_err(|_| TargetError::InvalidUrl {
            input: trimmed.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TargetError::UnsupportedScheme {
                    input: trimmed.to_string(),
                    scheme: other.to_string(),
                })
            }
        }

        if url.host_str().is_none() {
            return Err(TargetError::InvalidUrl {
                input: trimmed.to_string(),
            });
        }

        Ok(Self {
            url,
            raw: trimmed.to_string(),
        })
    }

    /// 解析后的URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 用户输入的原始字符串
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// 判断一行输入是否为结束标记
pub fn is_sentinel(input: &str) -> bool {
    input.trim() == SENTINEL
}

/// 批量解析检测目标，遇到第一个非法输入即返回错误
pub fn parse_targets<I, S>(inputs: I) -> Result<Vec<CheckTarget>, TargetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let targets = inputs
        .into_iter()
        .map(|input| CheckTarget::parse(input.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if targets.is_empty() {
        return Err(TargetError::Empty);
    }
    Ok(targets)
}

impl FromStr for CheckTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CheckTarget {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CheckTarget> for String {
    fn from(target: CheckTarget) -> Self {
        target.raw
    }
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_url() {
        let target = CheckTarget::parse("https://example.com").unwrap();
        assert_eq!(target.as_str(), "https://example.com");
        assert_eq!(target.url().host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let target = CheckTarget::parse("  http://localhost:8080/health \n").unwrap();
        assert_eq!(target.as_str(), "http://localhost:8080/health");
    }

    #[test]
    fn test_parse_invalid_url() {
        assert_eq!(
            CheckTarget::parse("abc"),
            Err(TargetError::InvalidUrl {
                input: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_sentinel_is_never_a_target() {
        assert_eq!(
            CheckTarget::parse("done"),
            Err(TargetError::Sentinel("done".to_string()))
        );
        assert!(is_sentinel(" done "));
        assert!(!is_sentinel("https://done.example"));
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = CheckTarget::parse("ftp://example.com/file").unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedScheme { ref scheme, .. } if scheme == "ftp"));
    }

    #[test]
    fn test_parse_targets_keeps_order() {
        let targets =
            parse_targets(["https://b.example", "https://a.example", "https://c.example"]).unwrap();
        let raw: Vec<&str> = targets.iter().map(CheckTarget::as_str).collect();
        assert_eq!(
            raw,
            vec!["https://b.example", "https://a.example", "https://c.example"]
        );
    }

    #[test]
    fn test_parse_targets_empty() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(parse_targets(empty), Err(TargetError::Empty));
    }

    #[test]
    fn test_serde_roundtrip_through_string() {
        let target: CheckTarget = serde_json::from_str("\"https://example.com/a\"").unwrap();
        assert_eq!(target.as_str(), "https://example.com/a");
        assert!(serde_json::from_str::<CheckTarget>("\"not a url\"").is_err());
    }
}
