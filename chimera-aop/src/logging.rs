//! 日志配置
//!
//! 引擎本身只通过 `tracing` 宏输出日志；这里为使用方提供一个基于
//! `tracing-subscriber` 的初始化入口。

use crate::error::{PointcutError, PointcutResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 紧凑格式（默认）
    Compact,
    /// 完整格式
    Full,
    /// JSON 格式
    Json,
    /// 美化格式（适合开发）
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Compact => "compact",
            LogFormat::Full => "full",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        write!(f, "{}", name)
    }
}

/// 日志配置
///
/// 可以直接构建，也可以作为 `[logging]` 表出现在引擎配置中
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（默认：Info）
    pub level: LogLevel,

    /// 日志格式（默认：Compact）
    pub format: LogFormat,

    /// 是否显示目标（模块路径）（默认：false）
    pub show_target: bool,

    /// 是否显示线程名（默认：false）
    ///
    /// cflow 栈按线程隔离，排查控制流匹配时很有用
    pub show_thread_names: bool,

    /// 自定义过滤器，例如 `"chimera_aop=trace"`
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_names: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn show_thread_names(mut self, show: bool) -> Self {
        self.show_thread_names = show;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 用环境变量覆盖：`RUST_LOG`（过滤器）、`LOG_LEVEL`、`LOG_FORMAT`
    ///
    /// 无法解析的值被忽略
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.filter = Some(rust_log);
        }
        if let Some(level) = std::env::var("LOG_LEVEL").ok().and_then(|value| value.parse().ok()) {
            self.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|value| value.parse().ok()) {
            self.format = format;
        }
        self
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| fallback()),
            None => fallback(),
        }
    }

    /// 初始化全局订阅者，已经初始化过时返回错误
    pub fn init(self) -> PointcutResult<()> {
        let builder = subscriber_fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.show_target)
            .with_thread_names(self.show_thread_names);

        let result = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };
        result.map_err(|e| PointcutError::LoggingInit(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_builder() {
        let config = LoggingConfig::new()
            .level(LogLevel::Trace)
            .format(LogFormat::Pretty)
            .show_target(true)
            .filter("chimera_aop=trace");

        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.show_target);
        assert_eq!(config.filter.as_deref(), Some("chimera_aop=trace"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"\nformat = \"json\"").unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.show_target);
    }
}
