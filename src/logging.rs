//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能。
//! 实时表格占用标准输出，所以日志默认写入文件，控制台日志只输出到标准错误。

use crate::health::PollCycle;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 初始化失败时的错误信息
    init_error: Option<String>,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径，为空时输出到标准错误
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: Some(get_default_log_path()),
            json_format: false,
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，重复调用返回新的句柄
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        Self::setup_logging_with_options(config, false)
    }

    /// 初始化日志系统（带选项）
    ///
    /// # 参数
    /// * `config` - 日志配置
    /// * `force_reinit` - 是否强制重新初始化（主要用于测试）
    pub fn setup_logging_with_options(
        config: LogConfig,
        force_reinit: bool,
    ) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));

        {
            let state = lock_state(state_mutex);
            if state.initialized && !force_reinit {
                if let Some(ref e) = state.init_error {
                    return Err(anyhow::anyhow!("日志系统之前初始化失败: {}", e));
                }
                return Ok(Self { config });
            }
        }

        let init_result = Self::perform_initialization(&config);

        {
            let mut state = lock_state(state_mutex);
            state.initialized = true;
            state.current_config = Some(config.clone());
            state.init_error = init_result.as_ref().err().map(|e| e.to_string());
        }

        init_result?;
        Ok(Self { config })
    }

    /// 当前句柄使用的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 执行实际的日志系统初始化
    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        Self::init_log_tracer()?;
        Self::init_tracing_subscriber(config)
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        let mut layers = Vec::new();

        if let Some(file_path) = &config.file_path {
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| anyhow::anyhow!("创建日志目录失败: {}", e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)
                .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;

            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true);
            layers.push(if config.json_format {
                file_layer.json().boxed()
            } else {
                file_layer.boxed()
            });
        }

        if config.file_path.is_none() {
            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_target(true);
            layers.push(if config.json_format {
                console_layer.json().boxed()
            } else {
                console_layer.boxed()
            });
        }

        let result = registry().with(layers.with_filter(env_filter)).try_init();

        match result {
            Ok(()) => {
                tracing::info!("日志系统初始化完成");
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                // LogTracer 已经单独初始化过，try_init 再次设置 logger 会失败
                if error_msg.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || error_msg.contains("a global default trace dispatcher has already been set")
                {
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        let tracing_level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(tracing_level)
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .map(|state| lock_state(state).initialized)
            .unwrap_or(false)
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE
            .get()
            .and_then(|state| lock_state(state).current_config.clone())
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state_mutex) = GLOBAL_LOGGING_STATE.get() {
            let mut state = lock_state(state_mutex);
            *state = GlobalLoggingState::default();
        }
    }
}

/// 获取全局状态锁，忽略中毒状态
fn lock_state(state: &Mutex<GlobalLoggingState>) -> std::sync::MutexGuard<'_, GlobalLoggingState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 记录一次轮询完成
///
/// 汇总写入 info/warn，逐个目标的结果写入 debug
pub fn log_poll_cycle(cycle: &PollCycle) {
    let failures = cycle.failure_count();
    let total = cycle.len();
    let elapsed_ms = (cycle.completed_at - cycle.started_at).num_milliseconds();

    if failures > 0 {
        tracing::warn!(cycle_id = %cycle.id, failures, total, elapsed_ms, "轮询完成，部分目标无法访问");
    } else {
        tracing::info!(cycle_id = %cycle.id, total, elapsed_ms, "轮询完成");
    }

    for result in &cycle.results {
        tracing::debug!(
            cycle_id = %cycle.id,
            target = %result.target,
            outcome = %result.outcome,
            response_time_ms = result.response_time_ms(),
            "检测结果"
        );
    }
}

/// 获取默认日志文件路径
pub fn get_default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(crate::APP_NAME)
        .join(format!("{}.log", crate::APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    /// 创建测试用的日志配置
    fn create_test_config(dir: &TempDir) -> LogConfig {
        LogConfig {
            level: LevelFilter::Info,
            file_path: Some(dir.path().join("logs").join("test.log")),
            json_format: false,
        }
    }

    #[test]
    #[serial]
    fn test_logging_system_single_initialization() {
        LoggingSystem::reset_for_testing();
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let first = LoggingSystem::setup_logging(config.clone());
        assert!(first.is_ok());
        assert!(LoggingSystem::is_initialized());

        // 第二次调用不会重复初始化
        let second = LoggingSystem::setup_logging(config);
        assert!(second.is_ok());
    }

    #[test]
    #[serial]
    fn test_log_directory_is_created() {
        LoggingSystem::reset_for_testing();
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let system = LoggingSystem::setup_logging_with_options(config, true).unwrap();
        let path = system.config().file_path.clone().unwrap();
        assert!(path.parent().unwrap().exists());
        assert!(path.exists());
    }

    #[test]
    #[serial]
    fn test_current_config_retrieval() {
        LoggingSystem::reset_for_testing();
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.json_format = true;

        let _system = LoggingSystem::setup_logging(config.clone()).unwrap();

        let current = LoggingSystem::current_config().unwrap();
        assert_eq!(current.level, config.level);
        assert!(current.json_format);
        assert_eq!(current.file_path, config.file_path);
    }

    #[test]
    #[serial]
    fn test_stderr_logging_without_file() {
        LoggingSystem::reset_for_testing();
        let config = LogConfig {
            level: LevelFilter::Debug,
            file_path: None,
            json_format: true,
        };

        let system = LoggingSystem::setup_logging_with_options(config, true).unwrap();
        assert!(system.config().file_path.is_none());
        assert!(LoggingSystem::current_config().unwrap().json_format);
    }

    #[test]
    fn test_default_log_path() {
        let path = get_default_log_path();
        assert!(path.to_string_lossy().ends_with("two-hundred.log"));
    }

    #[test]
    fn test_default_config_logs_to_file_only() {
        let config = LogConfig::default();
        assert!(config.file_path.is_some());
        assert!(!config.json_format);
    }
}
