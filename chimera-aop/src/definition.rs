//! 切点定义与加载
//!
//! 定义可以来自配置文件（[`PointcutDefinition`]），也可以在编译期通过
//! [`register_pointcut!`](crate::register_pointcut) 注册，由 inventory 收集。

use crate::error::{PointcutError, PointcutResult};
use crate::namespace::NamespaceRegistry;
use crate::pointcut::PointcutType;
use serde::Deserialize;

/// 编译期注册的切点
///
/// 用于 inventory 自动收集，通常由 `register_pointcut!` 宏生成
#[derive(Debug)]
pub struct PointcutRegistration {
    /// 命名空间键
    pub namespace: &'static str,

    /// 表达式名称
    pub name: &'static str,

    /// 切点类型，为空时按布尔表达式处理
    pub pointcut_type: Option<PointcutType>,

    /// 表达式文本
    pub expression: &'static str,

    /// 未限定类名使用的默认包
    pub package: Option<&'static str>,
}

impl PointcutRegistration {
    pub const fn new(
        namespace: &'static str,
        name: &'static str,
        pointcut_type: Option<PointcutType>,
        expression: &'static str,
    ) -> Self {
        Self {
            namespace,
            name,
            pointcut_type,
            expression,
            package: None,
        }
    }

    pub const fn with_package(mut self, package: &'static str) -> Self {
        self.package = Some(package);
        self
    }
}

// 使用 inventory 收集所有切点注册
inventory::collect!(PointcutRegistration);

/// 获取所有编译期注册的切点
pub fn get_all_pointcut_registrations() -> impl Iterator<Item = &'static PointcutRegistration> {
    inventory::iter::<PointcutRegistration>()
}

/// 一条切点定义
///
/// 对应配置文件中的一个 `[[pointcut]]` 表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PointcutDefinition {
    /// 命名空间，为空时使用注册表的默认命名空间
    #[serde(default)]
    pub namespace: Option<String>,

    pub name: String,

    #[serde(default, rename = "type")]
    pub pointcut_type: Option<PointcutType>,

    pub expression: String,

    #[serde(default)]
    pub package: Option<String>,
}

impl PointcutDefinition {
    pub fn new(name: impl Into<String>, pointcut_type: Option<PointcutType>, expression: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            pointcut_type,
            expression: expression.into(),
            package: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }
}

impl From<&PointcutRegistration> for PointcutDefinition {
    fn from(registration: &PointcutRegistration) -> Self {
        Self {
            namespace: Some(registration.namespace.to_string()),
            name: registration.name.to_string(),
            pointcut_type: registration.pointcut_type,
            expression: registration.expression.to_string(),
            package: registration.package.map(str::to_string),
        }
    }
}

impl NamespaceRegistry {
    /// 批量加载定义
    ///
    /// 引用尚未定义的表达式会推迟到下一轮，直到某一轮没有任何进展；
    /// 因此定义的先后顺序无关紧要。返回成功加载的数量。
    pub fn load_definitions(
        &self,
        definitions: &[PointcutDefinition],
        default_package: Option<&str>,
    ) -> PointcutResult<usize> {
        let mut pending: Vec<&PointcutDefinition> = definitions.iter().collect();
        let mut loaded = 0;

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            let mut last_unresolved = None;

            for definition in pending {
                let key = definition
                    .namespace
                    .as_deref()
                    .unwrap_or_else(|| self.default_namespace_key());
                let package = definition.package.as_deref().or(default_package);
                let namespace = self.namespace(key);

                match namespace.define(&definition.expression, package, &definition.name, definition.pointcut_type) {
                    Ok(_) => loaded += 1,
                    Err(err @ PointcutError::UnresolvedReference { .. }) => {
                        tracing::trace!("Deferring pointcut '{}': {}", definition.name, err);
                        deferred.push(definition);
                        last_unresolved = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }

            if deferred.len() == before {
                if let Some(err) = last_unresolved {
                    return Err(err);
                }
            }
            pending = deferred;
        }

        tracing::info!("Loaded {} pointcut definition(s)", loaded);
        Ok(loaded)
    }

    /// 加载所有通过 inventory 注册的切点
    ///
    /// 使用示例：
    /// ```ignore
    /// let registry = NamespaceRegistry::new();
    /// registry.auto_load_pointcuts()?;
    /// ```
    pub fn auto_load_pointcuts(&self) -> PointcutResult<usize> {
        let definitions: Vec<PointcutDefinition> = get_all_pointcut_registrations()
            .map(|registration| {
                tracing::debug!(
                    "  ├─ Found pointcut: {}::{} = {}",
                    registration.namespace,
                    registration.name,
                    registration.expression
                );
                PointcutDefinition::from(registration)
            })
            .collect();
        tracing::info!("Auto-loading {} pointcut(s) from registry", definitions.len());

        self.load_definitions(&definitions, None)
    }
}

/// 在编译期注册切点
///
/// 使用示例：
/// ```ignore
/// chimera_aop::register_pointcut!("logging", "services", Execution, "* com.example..*Service.*(..)");
/// chimera_aop::register_pointcut!("logging", "tracedServices", "services AND NOT attribute(Untraced)");
/// ```
#[macro_export]
macro_rules! register_pointcut {
    ($namespace:expr, $name:expr, $pointcut_type:ident, $expression:expr) => {
        $crate::inventory::submit! {
            $crate::PointcutRegistration::new(
                $namespace,
                $name,
                ::core::option::Option::Some($crate::PointcutType::$pointcut_type),
                $expression,
            )
        }
    };
    ($namespace:expr, $name:expr, $expression:expr) => {
        $crate::inventory::submit! {
            $crate::PointcutRegistration::new($namespace, $name, ::core::option::Option::None, $expression)
        }
    };
}
