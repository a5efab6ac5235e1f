//! 引擎配置
//!
//! 从 TOML 加载，环境变量覆盖：
//!
//! ```toml
//! [engine]
//! default_namespace = "default"
//! default_package = "com.example"
//!
//! [cache]
//! enabled = true
//! max_entries = 4096
//!
//! [logging]
//! level = "info"
//!
//! [[pointcut]]
//! namespace = "logging"
//! name = "services"
//! type = "execution"
//! expression = "* com.example..*Service.*(..)"
//! ```

use crate::cache::{MatchCache, DEFAULT_MAX_ENTRIES};
use crate::definition::PointcutDefinition;
use crate::error::{PointcutError, PointcutResult};
use crate::logging::LoggingConfig;
use crate::namespace::{NamespaceRegistry, DEFAULT_NAMESPACE};
use serde::Deserialize;
use std::path::Path;

/// 环境变量：默认命名空间
pub const ENV_DEFAULT_NAMESPACE: &str = "AOP_DEFAULT_NAMESPACE";
/// 环境变量：默认包
pub const ENV_DEFAULT_PACKAGE: &str = "AOP_DEFAULT_PACKAGE";
/// 环境变量：是否启用匹配缓存
pub const ENV_MATCH_CACHE: &str = "AOP_MATCH_CACHE";
/// 环境变量：匹配缓存最大条目数
pub const ENV_MATCH_CACHE_MAX_ENTRIES: &str = "AOP_MATCH_CACHE_MAX_ENTRIES";

/// `[engine]` 表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub default_namespace: String,
    pub default_package: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            default_package: None,
        }
    }
}

/// `[cache]` 表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub engine: EngineSection,
    pub cache: CacheSection,
    pub logging: LoggingConfig,
    #[serde(rename = "pointcut")]
    pub pointcuts: Vec<PointcutDefinition>,
}

impl EngineConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> PointcutResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> PointcutResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading engine configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 默认配置加环境变量覆盖
    pub fn from_env() -> PointcutResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(mut self) -> PointcutResult<Self> {
        if let Ok(namespace) = std::env::var(ENV_DEFAULT_NAMESPACE) {
            self.engine.default_namespace = namespace;
        }
        if let Ok(package) = std::env::var(ENV_DEFAULT_PACKAGE) {
            self.engine.default_package = Some(package).filter(|p| !p.trim().is_empty());
        }
        if let Ok(enabled) = std::env::var(ENV_MATCH_CACHE) {
            self.cache.enabled = parse_bool(ENV_MATCH_CACHE, &enabled)?;
        }
        if let Ok(max_entries) = std::env::var(ENV_MATCH_CACHE_MAX_ENTRIES) {
            self.cache.max_entries = max_entries.trim().parse().map_err(|_| {
                PointcutError::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_MATCH_CACHE_MAX_ENTRIES, max_entries
                ))
            })?;
        }
        self.logging = self.logging.with_env_overrides();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> PointcutResult<()> {
        if self.engine.default_namespace.trim().is_empty() {
            return Err(PointcutError::Config("engine.default_namespace must not be empty".to_string()));
        }
        if let Some(definition) = self.pointcuts.iter().find(|definition| definition.name.trim().is_empty()) {
            return Err(PointcutError::Config(format!(
                "pointcut with expression '{}' has an empty name",
                definition.expression
            )));
        }
        Ok(())
    }

    /// 创建注册表并加载所有 `[[pointcut]]` 定义
    pub fn build_registry(&self) -> PointcutResult<NamespaceRegistry> {
        let registry = NamespaceRegistry::with_default_namespace(self.engine.default_namespace.as_str());
        registry.load_definitions(&self.pointcuts, self.engine.default_package.as_deref())?;
        Ok(registry)
    }

    /// 按 `[cache]` 创建匹配缓存，未启用时为 `None`
    pub fn build_cache(&self) -> Option<MatchCache> {
        self.cache
            .enabled
            .then(|| MatchCache::new(self.cache.max_entries))
    }
}

fn parse_bool(key: &str, value: &str) -> PointcutResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(PointcutError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::metadata::{ClassInfo, MemberInfo};
    use crate::pointcut::PointcutType;

    const CONFIG: &str = r#"
[engine]
default_namespace = "app"
default_package = "com.example"

[cache]
max_entries = 16

[logging]
level = "debug"

[[pointcut]]
name = "tracedServices"
expression = "services AND NOT untraced"

[[pointcut]]
name = "services"
type = "execution"
expression = "* com.example..*Service.*(..)"

[[pointcut]]
namespace = "audit"
name = "untraced"
type = "attribute"
expression = "Untraced"

[[pointcut]]
name = "untraced"
type = "attribute"
expression = "Untraced"
"#;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.engine.default_namespace, "default");
        assert!(config.engine.default_package.is_none());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 4096);
        assert!(config.pointcuts.is_empty());
    }

    #[test]
    fn test_parse() {
        let config = EngineConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.engine.default_namespace, "app");
        assert_eq!(config.engine.default_package.as_deref(), Some("com.example"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 16);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.pointcuts.len(), 4);
        assert_eq!(config.pointcuts[1].pointcut_type, Some(PointcutType::Execution));
        assert_eq!(config.pointcuts[2].namespace.as_deref(), Some("audit"));
    }

    #[test]
    fn test_build_registry() {
        let config = EngineConfig::from_toml_str(CONFIG).unwrap();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.keys(), vec!["app", "audit"]);

        let traced = registry.expression("app", "tracedServices").unwrap();
        let class = ClassInfo::new("com.example.order.OrderService");
        assert!(traced.matches(&class, &MemberInfo::method("com.example.order.OrderService", "place")));

        let cache = config.build_cache().unwrap();
        assert_eq!(cache.max_entries(), 16);
    }

    #[test]
    fn test_cache_disabled() {
        let config = EngineConfig::from_toml_str("[cache]\nenabled = false").unwrap();
        assert!(config.build_cache().is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EngineConfig::from_toml_str("[engine]\ndefault_namespace = \"\""),
            Err(PointcutError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[[pointcut]]\nname = \"x\"\ntype = \"bogus\"\nexpression = \"y\""),
            Err(PointcutError::Toml(_))
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(ENV_MATCH_CACHE, "ON").unwrap());
        assert!(!parse_bool(ENV_MATCH_CACHE, "0").unwrap());
        assert!(parse_bool(ENV_MATCH_CACHE, "maybe").is_err());
    }
}
