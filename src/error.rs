//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Two Hundred 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum TwoHundredError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 检测目标相关错误
    #[error("目标错误: {0}")]
    Target(#[from] TargetError),

    /// 状态检测器相关错误
    #[error("状态检测错误: {0}")]
    Check(#[from] CheckError),

    /// 启动阶段的致命错误
    #[error("启动失败: {0}")]
    Startup(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 检测目标错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TargetError {
    /// 无法解析为URL
    #[error("无效的URL: {input}")]
    InvalidUrl { input: String },

    /// 不支持的协议
    #[error("不支持的协议 {scheme}: {input}")]
    UnsupportedScheme { input: String, scheme: String },

    /// 结束输入的哨兵值不能作为目标
    #[error("\"{0}\" 是输入结束标记，不能作为检测目标")]
    Sentinel(String),

    /// 没有任何检测目标
    #[error("没有提供任何检测目标")]
    Empty,
}

/// 状态检测器错误类型
///
/// 只在构建检测器时出现；单次检测的传输错误会被映射为失败标记，不会以错误形式返回
#[derive(Error, Debug)]
pub enum CheckError {
    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, TwoHundredError>;
