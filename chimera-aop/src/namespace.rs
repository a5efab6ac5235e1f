//! 表达式命名空间与命名空间注册表
//!
//! 命名空间对应一个切面定义，名称在其中唯一。
//! 注册表按定义键管理命名空间，首次访问时创建，之后所有调用方共享同一个实例。

use crate::error::PointcutResult;
use crate::expression::{parser, Expression};
use crate::pointcut::PointcutType;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// 默认命名空间键
pub const DEFAULT_NAMESPACE: &str = "default";

/// 进程级注册表
///
/// 首次访问时创建，并加载所有通过 inventory 注册的切点
static GLOBAL_NAMESPACE_REGISTRY: Lazy<NamespaceRegistry> = Lazy::new(|| {
    let registry = NamespaceRegistry::new();
    if let Err(err) = registry.auto_load_pointcuts() {
        tracing::error!("Failed to auto-load registered pointcuts: {}", err);
    }
    registry
});

/// 获取进程级注册表
///
/// 优先使用显式创建并传递的 [`NamespaceRegistry`]；这里只是为
/// `register_pointcut!` 注册的切点提供一个现成的入口。
pub fn global_registry() -> &'static NamespaceRegistry {
    &GLOBAL_NAMESPACE_REGISTRY
}

/// 表达式命名空间
///
/// 读多写少：注册通常只发生在加载阶段，匹配阶段只做查找
#[derive(Debug)]
pub struct ExpressionNamespace {
    name: String,
    expressions: RwLock<HashMap<String, Arc<Expression>>>,
}

impl ExpressionNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expressions: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册表达式，同名表达式会被替换
    pub fn register(&self, expression: Expression) -> Arc<Expression> {
        let expression = Arc::new(expression);
        let previous = self
            .expressions
            .write()
            .insert(expression.name().to_string(), expression.clone());

        match previous {
            Some(_) => tracing::debug!(
                "Replaced expression '{}' in namespace '{}': {}",
                expression.name(),
                self.name,
                expression.text()
            ),
            None => tracing::debug!(
                "Registered {} expression '{}' in namespace '{}': {}",
                expression.pointcut_type(),
                expression.name(),
                self.name,
                expression.text()
            ),
        }
        expression
    }

    pub fn get(&self, name: &str) -> Option<Arc<Expression>> {
        self.expressions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.expressions.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.expressions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.read().is_empty()
    }

    /// 已注册的名称（排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.expressions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 按类型创建表达式（不注册）
    ///
    /// - ATTRIBUTE 总是叶子
    /// - 指定了类型且文本看起来像单个模式时创建叶子
    /// - 其它情况按布尔表达式处理，`pointcut_type` 作为声明的类型参与检查
    pub fn create_expression(
        &self,
        text: &str,
        package: Option<&str>,
        name: &str,
        pointcut_type: Option<PointcutType>,
    ) -> PointcutResult<Expression> {
        match pointcut_type {
            Some(PointcutType::Attribute) => self.create_leaf(text, package, name, PointcutType::Attribute),
            Some(pointcut_type) if parser::looks_like_leaf(text) => {
                self.create_leaf(text, package, name, pointcut_type)
            }
            declared => self.create_composite(text, package, name, declared),
        }
    }

    /// 创建叶子表达式
    pub fn create_leaf(
        &self,
        text: &str,
        package: Option<&str>,
        name: &str,
        pointcut_type: PointcutType,
    ) -> PointcutResult<Expression> {
        tracing::trace!("Compiling {} leaf '{}' in namespace '{}'", pointcut_type, name, self.name);
        Expression::leaf(name, self.name.as_str(), text, package, pointcut_type)
    }

    /// 创建组合表达式，引用在本命名空间中解析
    pub fn create_composite(
        &self,
        text: &str,
        package: Option<&str>,
        name: &str,
        declared: Option<PointcutType>,
    ) -> PointcutResult<Expression> {
        tracing::trace!("Building composite '{}' in namespace '{}'", name, self.name);
        Expression::composite(name, self, text, package, declared)
    }

    /// 创建并注册
    pub fn define(
        &self,
        text: &str,
        package: Option<&str>,
        name: &str,
        pointcut_type: Option<PointcutType>,
    ) -> PointcutResult<Arc<Expression>> {
        let expression = self.create_expression(text, package, name, pointcut_type)?;
        Ok(self.register(expression))
    }
}

/// 命名空间注册表
#[derive(Debug)]
pub struct NamespaceRegistry {
    default_key: String,
    namespaces: DashMap<String, Arc<ExpressionNamespace>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::with_default_namespace(DEFAULT_NAMESPACE)
    }

    /// 指定默认命名空间键
    pub fn with_default_namespace(key: impl Into<String>) -> Self {
        Self {
            default_key: key.into(),
            namespaces: DashMap::new(),
        }
    }

    /// 获取命名空间，不存在时创建
    ///
    /// 并发首次访问时只会创建一个实例
    pub fn namespace(&self, key: &str) -> Arc<ExpressionNamespace> {
        if let Some(namespace) = self.namespaces.get(key) {
            return namespace.clone();
        }

        self.namespaces
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating expression namespace '{}'", key);
                Arc::new(ExpressionNamespace::new(key))
            })
            .clone()
    }

    pub fn default_namespace_key(&self) -> &str {
        &self.default_key
    }

    pub fn default_namespace(&self) -> Arc<ExpressionNamespace> {
        self.namespace(&self.default_key)
    }

    /// 获取已存在的命名空间，不创建
    pub fn get(&self, key: &str) -> Option<Arc<ExpressionNamespace>> {
        self.namespaces.get(key).map(|namespace| namespace.clone())
    }

    /// 在指定命名空间中查找表达式
    pub fn expression(&self, namespace: &str, name: &str) -> Option<Arc<Expression>> {
        self.get(namespace).and_then(|namespace| namespace.get(name))
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// 所有命名空间键（排序）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.namespaces.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassInfo, MemberInfo};

    #[test]
    fn test_register_and_replace() {
        let namespace = ExpressionNamespace::new("test");
        namespace
            .define("* com.foo.Bar.run(..)", None, "pc", Some(PointcutType::Execution))
            .unwrap();
        assert_eq!(namespace.len(), 1);

        let class = ClassInfo::new("com.foo.Bar");
        let run = MemberInfo::method("com.foo.Bar", "run");
        let stop = MemberInfo::method("com.foo.Bar", "stop");
        let pc = namespace.get("pc").unwrap();
        assert!(pc.matches(&class, &run));
        assert!(!pc.matches(&class, &stop));

        namespace
            .define("* com.foo.Bar.stop(..)", None, "pc", Some(PointcutType::Execution))
            .unwrap();
        assert_eq!(namespace.len(), 1);
        let replaced = namespace.get("pc").unwrap();
        assert!(!replaced.matches(&class, &run));
        assert!(replaced.matches(&class, &stop));

        // 已取得的引用不受替换影响
        assert!(pc.matches(&class, &run));
    }

    #[test]
    fn test_create_expression_dispatch() {
        let namespace = ExpressionNamespace::new("test");
        namespace
            .define("* com.foo.Bar.*(..)", None, "methods", Some(PointcutType::Execution))
            .unwrap();

        let attribute = namespace
            .create_expression("Cacheable", None, "cached", Some(PointcutType::Attribute))
            .unwrap();
        assert!(attribute.is_leaf());

        let reference = namespace
            .create_expression("methods", None, "alias", Some(PointcutType::Execution))
            .unwrap();
        assert!(!reference.is_leaf());
        assert_eq!(reference.pointcut_type(), PointcutType::Execution);

        let composite = namespace
            .create_expression("methods AND NOT cached", None, "composite", None);
        // `cached` 没有注册
        assert!(composite.is_err());
    }

    #[test]
    fn test_names() {
        let namespace = ExpressionNamespace::new("test");
        namespace.define("com.foo.B", None, "b", Some(PointcutType::Class)).unwrap();
        namespace.define("com.foo.A", None, "a", Some(PointcutType::Class)).unwrap();
        assert_eq!(namespace.names(), vec!["a", "b"]);
        assert!(namespace.contains("a"));
        assert!(!namespace.contains("c"));
    }

    #[test]
    fn test_registry_returns_shared_namespace() {
        let registry = NamespaceRegistry::new();
        let first = registry.namespace("aspect");
        let second = registry.namespace("aspect");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.default_namespace().name(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_concurrent_first_access() {
        let registry = NamespaceRegistry::new();
        let namespaces: Vec<Arc<ExpressionNamespace>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.namespace("shared")))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(registry.len(), 1);
        assert!(namespaces.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn test_concurrent_register_distinct_names() {
        let registry = NamespaceRegistry::new();
        let namespace = registry.namespace("shared");
        std::thread::scope(|scope| {
            for thread in 0..8 {
                let namespace = &namespace;
                scope.spawn(move || {
                    for index in 0..16 {
                        let name = format!("pc{}_{}", thread, index);
                        namespace
                            .define("* com.foo.Bar.*(..)", None, &name, Some(PointcutType::Execution))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(namespace.len(), 8 * 16);
        for thread in 0..8 {
            for index in 0..16 {
                let name = format!("pc{}_{}", thread, index);
                assert_eq!(namespace.get(&name).unwrap().name(), name);
            }
        }
    }
}
