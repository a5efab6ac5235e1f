//! 名称通配符
//!
//! 支持的写法：
//! - `*` 单独出现时匹配任意名称
//! - 类型名中的 `*` 匹配不含 `.` 的任意字符，例如 `com.foo.*Service`
//! - 类型名中的 `..` 匹配任意层（包括零层）中间包，例如 `com..*Dao`
//! - 成员名中的 `*` 匹配任意字符，例如 `get*`

use crate::hierarchy;
use crate::metadata::{simple_name, ClassInfo, Modifiers};
use regex::Regex;
use std::fmt;

/// 编译后的名称模式
#[derive(Clone)]
pub enum NamePattern {
    /// 匹配任意名称
    Any,
    /// 精确匹配
    Exact(String),
    /// 通配符匹配
    Wildcard { source: String, regex: Regex },
}

impl NamePattern {
    /// 编译类型名模式（`*` 不跨越 `.`，`..` 匹配中间包）
    pub(crate) fn compile_type(text: &str) -> Result<Self, String> {
        Self::compile(text, true)
    }

    /// 编译成员名模式（`*` 匹配任意字符）
    pub(crate) fn compile_member(text: &str) -> Result<Self, String> {
        if text.contains('.') {
            return Err(format!("member name '{}' must not contain '.'", text));
        }
        Self::compile(text, false)
    }

    fn compile(text: &str, is_type: bool) -> Result<Self, String> {
        if text.is_empty() {
            return Err("empty name".to_string());
        }
        if let Some(c) = text.chars().find(|c| !is_name_char(*c)) {
            return Err(format!("illegal character '{}' in name '{}'", c, text));
        }
        if text == "*" {
            return Ok(NamePattern::Any);
        }
        if !text.contains('*') && !text.contains("..") {
            return Ok(NamePattern::Exact(text.to_string()));
        }

        let mut regex_source = String::with_capacity(text.len() * 2 + 2);
        regex_source.push('^');
        let mut rest = text;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("..").filter(|_| is_type) {
                if regex_source.len() == 1 {
                    regex_source.push_str(r"(?:.*\.)?");
                } else if tail.is_empty() {
                    regex_source.push_str(r"\..*");
                } else {
                    regex_source.push_str(r"\.(?:.*\.)?");
                }
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix('*') {
                regex_source.push_str(if is_type { "[^.]*" } else { ".*" });
                rest = tail;
            } else {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    let mut buf = [0u8; 4];
                    regex_source.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                }
                rest = chars.as_str();
            }
        }
        regex_source.push('$');

        let regex = Regex::new(&regex_source)
            .map_err(|e| format!("cannot compile name '{}': {}", text, e))?;
        tracing::trace!("Compiled name pattern '{}' to /{}/", text, regex_source);

        Ok(NamePattern::Wildcard {
            source: text.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(exact) => exact == name,
            NamePattern::Wildcard { regex, .. } => regex.is_match(name),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, NamePattern::Any)
    }

    pub fn as_str(&self) -> &str {
        match self {
            NamePattern::Any => "*",
            NamePattern::Exact(exact) => exact,
            NamePattern::Wildcard { source, .. } => source,
        }
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Any => write!(f, "Any"),
            NamePattern::Exact(exact) => write!(f, "Exact({})", exact),
            NamePattern::Wildcard { source, .. } => write!(f, "Wildcard({})", source),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '*' | '[' | ']' | '<' | '>')
}

/// 参数、返回值、字段与异常的类型模式
///
/// 不含 `.` 的模式按简单类名匹配，`String` 可以匹配 `java.lang.String`
#[derive(Debug, Clone)]
pub struct TypePattern {
    name: NamePattern,
    simple: bool,
}

impl TypePattern {
    pub(crate) fn compile(text: &str) -> Result<Self, String> {
        if text.ends_with('+') {
            return Err(format!(
                "hierarchical type '{}' is only supported on declaring types",
                text
            ));
        }
        Ok(Self {
            name: NamePattern::compile_type(text)?,
            simple: !text.contains('.'),
        })
    }

    pub(crate) fn any() -> Self {
        Self {
            name: NamePattern::Any,
            simple: false,
        }
    }

    pub fn matches(&self, type_name: &str) -> bool {
        if self.simple {
            self.name.matches(simple_name(type_name))
        } else {
            self.name.matches(type_name)
        }
    }

    pub fn is_any(&self) -> bool {
        self.name.is_any()
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 修饰符约束：必须包含 `required`，不能包含 `forbidden`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierPattern {
    required: Modifiers,
    forbidden: Modifiers,
}

impl ModifierPattern {
    /// 由修饰符关键字编译，`!static` 表示不能是 static
    pub(crate) fn compile(tokens: &[&str]) -> Result<Self, String> {
        let mut pattern = ModifierPattern::default();
        for token in tokens {
            let (negated, keyword) = match token.strip_prefix('!') {
                Some(keyword) => (true, keyword),
                None => (false, *token),
            };
            let modifier = Modifiers::from_keyword(keyword)
                .ok_or_else(|| format!("unknown modifier '{}'", token))?;
            if negated {
                pattern.forbidden = pattern.forbidden | modifier;
            } else {
                pattern.required = pattern.required | modifier;
            }
        }
        if pattern.required.intersects(pattern.forbidden) {
            return Err("a modifier is both required and forbidden".to_string());
        }
        Ok(pattern)
    }

    pub fn matches(&self, modifiers: Modifiers) -> bool {
        modifiers.contains(self.required) && !modifiers.intersects(self.forbidden)
    }

    pub fn is_any(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }
}

/// 类模式
///
/// 以 `+` 结尾的类模式是层次模式：匹配该类及其所有子类、实现类
#[derive(Debug, Clone)]
pub struct ClassPattern {
    name: NamePattern,
    simple: bool,
    hierarchical: bool,
    modifiers: ModifierPattern,
}

impl ClassPattern {
    /// 编译类名模式
    ///
    /// 不带包名的类名在提供了默认包时补全为 `package.Name`，否则只匹配简单类名
    pub(crate) fn compile(text: &str, package: Option<&str>) -> Result<Self, String> {
        let (text, hierarchical) = match text.strip_suffix('+') {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };
        if text.is_empty() {
            return Err("empty class name".to_string());
        }

        let package = package.map(str::trim).filter(|p| !p.is_empty());
        let unqualified = !text.contains('.') && text != "*";
        let (name, simple) = match (unqualified, package) {
            (true, Some(package)) => (NamePattern::compile_type(&format!("{}.{}", package, text))?, false),
            (true, None) => (NamePattern::compile_type(text)?, true),
            (false, _) => (NamePattern::compile_type(text)?, false),
        };

        Ok(Self {
            name,
            simple,
            hierarchical,
            modifiers: ModifierPattern::default(),
        })
    }

    pub(crate) fn any() -> Self {
        Self {
            name: NamePattern::Any,
            simple: false,
            hierarchical: false,
            modifiers: ModifierPattern::default(),
        }
    }

    pub(crate) fn with_modifiers(mut self, modifiers: ModifierPattern) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is_hierarchical(&self) -> bool {
        self.hierarchical
    }

    /// 只比较类名，不遍历层次结构
    pub fn matches_name(&self, class_name: &str) -> bool {
        if self.simple {
            self.name.matches(simple_name(class_name))
        } else {
            self.name.matches(class_name)
        }
    }

    /// 匹配类；层次模式会遍历接口与父类
    pub fn matches(&self, class: &ClassInfo) -> bool {
        if !self.modifiers.matches(class.modifiers()) {
            return false;
        }
        if self.hierarchical {
            hierarchy::any_in_hierarchy(class, |candidate| self.matches_name(candidate.name()))
        } else {
            self.matches_name(class.name())
        }
    }
}

impl fmt::Display for ClassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.hierarchical {
            write!(f, "+")?;
        }
        Ok(())
    }
}
