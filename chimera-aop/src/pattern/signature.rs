//! 成员签名模式：方法、构造器、字段以及调用方视角的组合模式

use super::name::{ClassPattern, ModifierPattern, NamePattern, TypePattern};
use crate::hierarchy;
use crate::metadata::{ClassInfo, MemberInfo};
use std::fmt;

/// 单个参数位置的匹配器
#[derive(Debug, Clone)]
pub enum ParameterMatcher {
    /// 具体或带通配符的类型
    Type(TypePattern),
    /// `*`：任意一个参数
    AnySingle,
    /// `..`：任意数量（包括零个）的参数
    AnyRemaining,
}

/// 参数列表模式
#[derive(Debug, Clone)]
pub struct ParameterPattern {
    matchers: Vec<ParameterMatcher>,
}

impl ParameterPattern {
    /// 编译括号内的参数列表，例如 `int, *, ..`
    pub(crate) fn compile(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self { matchers: Vec::new() });
        }

        let matchers = text
            .split(',')
            .map(|param| match param.trim() {
                "" => Err("empty parameter type".to_string()),
                ".." => Ok(ParameterMatcher::AnyRemaining),
                "*" => Ok(ParameterMatcher::AnySingle),
                other => TypePattern::compile(other).map(ParameterMatcher::Type),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { matchers })
    }

    /// `(..)`
    pub fn is_any(&self) -> bool {
        matches!(self.matchers.as_slice(), [ParameterMatcher::AnyRemaining])
    }

    pub fn matches(&self, parameter_types: &[String]) -> bool {
        match_parameters(&self.matchers, parameter_types)
    }
}

fn match_parameters(matchers: &[ParameterMatcher], types: &[String]) -> bool {
    match matchers.split_first() {
        None => types.is_empty(),
        Some((ParameterMatcher::AnyRemaining, rest)) => {
            (0..=types.len()).any(|skip| match_parameters(rest, &types[skip..]))
        }
        Some((matcher, rest)) => match types.split_first() {
            Some((first, tail)) => {
                let head_matches = match matcher {
                    ParameterMatcher::Type(pattern) => pattern.matches(first),
                    _ => true,
                };
                head_matches && match_parameters(rest, tail)
            }
            None => false,
        },
    }
}

impl fmt::Display for ParameterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .matchers
            .iter()
            .map(|m| match m {
                ParameterMatcher::Type(t) => t.to_string(),
                ParameterMatcher::AnySingle => "*".to_string(),
                ParameterMatcher::AnyRemaining => "..".to_string(),
            })
            .collect();
        write!(f, "({})", params.join(", "))
    }
}

/// throws 子句：每个模式都必须匹配成员声明的某个异常
fn exceptions_match(patterns: &[TypePattern], declared: &[String]) -> bool {
    patterns
        .iter()
        .all(|pattern| declared.iter().any(|exception| pattern.matches(exception)))
}

/// 抛出的异常类型需要匹配 throws 子句中的任意一个；没有 throws 子句时不做限制
fn exception_type_matches(patterns: &[TypePattern], exception_type: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|pattern| pattern.matches(exception_type))
}

/// 方法模式
#[derive(Debug, Clone)]
pub struct MethodPattern {
    pub(crate) modifiers: ModifierPattern,
    pub(crate) return_type: TypePattern,
    pub(crate) name: NamePattern,
    pub(crate) parameters: ParameterPattern,
    pub(crate) exceptions: Vec<TypePattern>,
}

impl MethodPattern {
    pub fn matches(&self, member: &MemberInfo) -> bool {
        member.is_method()
            && self.modifiers.matches(member.modifiers())
            && self.name.matches(member.name())
            && self.parameters.matches(member.parameter_types())
            && self.return_type.matches(member.return_type().unwrap_or("void"))
            && exceptions_match(&self.exceptions, member.exception_types())
    }
}

/// 构造器模式（成员名为 `new`，没有返回类型）
#[derive(Debug, Clone)]
pub struct ConstructorPattern {
    pub(crate) modifiers: ModifierPattern,
    pub(crate) parameters: ParameterPattern,
    pub(crate) exceptions: Vec<TypePattern>,
}

impl ConstructorPattern {
    pub fn matches(&self, member: &MemberInfo) -> bool {
        member.is_constructor()
            && self.modifiers.matches(member.modifiers())
            && self.parameters.matches(member.parameter_types())
            && exceptions_match(&self.exceptions, member.exception_types())
    }
}

/// 字段模式
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub(crate) modifiers: ModifierPattern,
    pub(crate) field_type: TypePattern,
    pub(crate) name: NamePattern,
}

impl FieldPattern {
    pub fn matches(&self, member: &MemberInfo) -> bool {
        member.is_field()
            && self.modifiers.matches(member.modifiers())
            && self.name.matches(member.name())
            && member
                .field_type()
                .is_some_and(|field_type| self.field_type.matches(field_type))
    }
}

/// 成员模式
#[derive(Debug, Clone)]
pub enum MemberPattern {
    Method(MethodPattern),
    Constructor(ConstructorPattern),
    Field(FieldPattern),
}

impl MemberPattern {
    pub fn matches(&self, member: &MemberInfo) -> bool {
        match self {
            MemberPattern::Method(pattern) => pattern.matches(member),
            MemberPattern::Constructor(pattern) => pattern.matches(member),
            MemberPattern::Field(pattern) => pattern.matches(member),
        }
    }

    pub fn matches_exception(&self, exception_type: &str) -> bool {
        match self {
            MemberPattern::Method(pattern) => exception_type_matches(&pattern.exceptions, exception_type),
            MemberPattern::Constructor(pattern) => {
                exception_type_matches(&pattern.exceptions, exception_type)
            }
            MemberPattern::Field(_) => true,
        }
    }
}

/// 调用方视角的模式：`被调用类#成员(参数)`
///
/// 被调用类带 `+` 时，匹配失败后会依次尝试被调用类的接口与父类
#[derive(Debug, Clone)]
pub struct CallerSidePattern {
    pub(crate) callee: ClassPattern,
    pub(crate) member: MemberPattern,
}

impl CallerSidePattern {
    pub fn callee(&self) -> &ClassPattern {
        &self.callee
    }

    pub fn member(&self) -> &MemberPattern {
        &self.member
    }

    pub fn is_hierarchical_callee(&self) -> bool {
        self.callee.is_hierarchical()
    }

    /// 匹配（被调用类，被调用成员）
    pub fn matches(&self, callee: &ClassInfo, member: &MemberInfo) -> bool {
        if self.matches_pair(callee, member) {
            return true;
        }
        self.callee.is_hierarchical()
            && hierarchy::any_in_hierarchy(callee, |candidate| self.matches_pair(candidate, member))
    }

    fn matches_pair(&self, callee: &ClassInfo, member: &MemberInfo) -> bool {
        self.callee.matches_name(callee.name()) && self.member.matches(member)
    }
}
