//! Chimera AOP - 切点表达式引擎
//!
//! 判断一个连接点（方法执行、调用、字段读写、异常处理器……）是否被切点选中：
//! - 模式编译：`public * com.foo.Bar+.do*(String, ..) throws IOException`
//! - 八种叶子表达式：execution、call、get、set、handler、cflow、class、attribute
//! - 布尔组合：`AND`、`OR`、`NOT`、`IN`、`NOT IN`，引用同一命名空间中的其它表达式
//! - 命名空间注册表与控制流（cflow）栈
//!
//! 使用示例：
//! ```ignore
//! use chimera_aop::prelude::*;
//!
//! let registry = NamespaceRegistry::new();
//! let namespace = registry.namespace("logging");
//! namespace.define("* com.foo..*Service.*(..)", None, "services", Some(PointcutType::Execution))?;
//! namespace.define("Untraced", None, "untraced", Some(PointcutType::Attribute))?;
//! let traced = namespace.define("services AND NOT untraced", None, "traced", None)?;
//!
//! if traced.matches(&class_info, &member_info) {
//!     // 织入通知
//! }
//! ```

pub mod cache;
pub mod cflow;
pub mod config;
pub mod definition;
pub mod error;
pub mod expression;
pub mod hierarchy;
pub mod joinpoint;
pub mod leaf;
pub mod logging;
pub mod metadata;
pub mod namespace;
pub mod pattern;
pub mod pointcut;

// 重新导出核心类型
pub use cache::MatchCache;
pub use cflow::{CflowFrame, CflowGuard, CflowStack};
pub use config::EngineConfig;
pub use definition::{get_all_pointcut_registrations, PointcutDefinition, PointcutRegistration};
pub use error::{PointcutError, PointcutResult};
pub use expression::{CflowPart, CompositeExpression, Expression, ExpressionKind};
pub use joinpoint::ExpressionContext;
pub use leaf::LeafExpression;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metadata::{ClassInfo, MemberInfo, MemberKind, Modifiers};
pub use namespace::{global_registry, ExpressionNamespace, NamespaceRegistry, DEFAULT_NAMESPACE};
pub use pattern::Pattern;
pub use pointcut::PointcutType;

// 导出 inventory 供宏使用
pub use inventory;

/// 预导入模块
pub mod prelude {
    pub use crate::cache::MatchCache;
    pub use crate::cflow::{CflowGuard, CflowStack};
    pub use crate::config::EngineConfig;
    pub use crate::error::{PointcutError, PointcutResult};
    pub use crate::expression::Expression;
    pub use crate::joinpoint::ExpressionContext;
    pub use crate::metadata::{ClassInfo, MemberInfo, Modifiers};
    pub use crate::namespace::{global_registry, ExpressionNamespace, NamespaceRegistry};
    pub use crate::pointcut::PointcutType;
    pub use crate::register_pointcut;
}
