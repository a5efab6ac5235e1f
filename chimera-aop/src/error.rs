//! 切点引擎错误定义
//!
//! 所有错误都发生在编译/加载阶段，匹配阶段永远不会返回错误

use crate::pointcut::PointcutType;
use thiserror::Error;

/// 切点引擎错误
#[derive(Debug, Error)]
pub enum PointcutError {
    /// 模式文本格式错误
    #[error("Invalid pattern '{pattern}': {reason}")]
    PatternSyntax { pattern: String, reason: String },

    /// 布尔表达式格式错误
    #[error("Invalid expression '{expression}': {reason}")]
    ExpressionSyntax { expression: String, reason: String },

    /// 布尔表达式组合了不兼容的切点类型
    #[error("Expression '{expression}' combines incompatible pointcut types {first} and {second}")]
    IncompatibleTypes {
        expression: String,
        first: PointcutType,
        second: PointcutType,
    },

    /// 引用在命名空间中不存在
    #[error("Unresolved reference '{name}' in namespace '{namespace}' (expression '{expression}')")]
    UnresolvedReference {
        name: String,
        namespace: String,
        expression: String,
    },

    /// 同一个表达式中出现多个不同的 cflow 子表达式
    #[error("Complex cflow expression not supported: '{expression}'")]
    ComplexCflowUnsupported { expression: String },

    /// 表达式只包含 cflow 部分，没有可匹配的主叶子
    #[error("Expression '{expression}' has no non-cflow leaf to match against")]
    NoPrimaryLeaf { expression: String },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML 解析失败
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// 读取配置文件失败
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// 日志系统初始化失败
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

impl PointcutError {
    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PatternSyntax {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExpressionSyntax {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

pub type PointcutResult<T> = Result<T, PointcutError>;
