//! 叶子表达式
//!
//! 每种切点类型一个变体，各自包装编译好的类模式与成员模式

use crate::error::{PointcutError, PointcutResult};
use crate::joinpoint::ExpressionContext;
use crate::metadata::{ClassInfo, MemberInfo};
use crate::pattern::{CallerSidePattern, ClassPattern, FieldPattern, MemberPattern, Pattern};
use crate::pointcut::PointcutType;

/// 叶子表达式
#[derive(Debug, Clone)]
pub enum LeafExpression {
    /// 方法或构造器执行
    Execution {
        class: ClassPattern,
        member: MemberPattern,
    },
    /// 方法或构造器调用（被调用类#成员）
    Call(CallerSidePattern),
    /// 字段读取
    Get { class: ClassPattern, field: FieldPattern },
    /// 字段写入
    Set { class: ClassPattern, field: FieldPattern },
    /// 异常处理器（类模式匹配异常类型）
    Handler(ClassPattern),
    /// 控制流，只出现在 IN / NOT IN 子表达式中
    Cflow(CallerSidePattern),
    /// 类
    Class(ClassPattern),
    /// 自定义属性名
    Attribute(String),
}

impl LeafExpression {
    /// 编译叶子表达式
    pub fn compile(text: &str, package: Option<&str>, pointcut_type: PointcutType) -> PointcutResult<Self> {
        if pointcut_type == PointcutType::Attribute {
            return compile_attribute(text);
        }

        let pattern = Pattern::compile(text, package, pointcut_type)?;
        let leaf = match (pointcut_type, pattern) {
            (PointcutType::Call, Pattern::CallerSide(caller_side)) => LeafExpression::Call(caller_side),
            (PointcutType::Cflow, Pattern::CallerSide(caller_side)) => LeafExpression::Cflow(caller_side),
            (PointcutType::Handler, Pattern::Class(class)) => LeafExpression::Handler(class),
            (PointcutType::Class, Pattern::Class(class)) => LeafExpression::Class(class),
            (PointcutType::Get, Pattern::Field { declaring_type, field }) => LeafExpression::Get {
                class: declaring_type,
                field,
            },
            (PointcutType::Set, Pattern::Field { declaring_type, field }) => LeafExpression::Set {
                class: declaring_type,
                field,
            },
            (PointcutType::Execution, pattern @ (Pattern::Method { .. } | Pattern::Constructor { .. })) => {
                match pattern.into_parts() {
                    (class, Some(member)) => LeafExpression::Execution { class, member },
                    (_, None) => return Err(PointcutError::pattern(text, "missing member signature")),
                }
            }
            (pointcut_type, _) => {
                return Err(PointcutError::pattern(
                    text,
                    format!("pattern kind does not fit a {} pointcut", pointcut_type),
                ))
            }
        };
        Ok(leaf)
    }

    pub fn pointcut_type(&self) -> PointcutType {
        match self {
            LeafExpression::Execution { .. } => PointcutType::Execution,
            LeafExpression::Call(_) => PointcutType::Call,
            LeafExpression::Get { .. } => PointcutType::Get,
            LeafExpression::Set { .. } => PointcutType::Set,
            LeafExpression::Handler(_) => PointcutType::Handler,
            LeafExpression::Cflow(_) => PointcutType::Cflow,
            LeafExpression::Class(_) => PointcutType::Class,
            LeafExpression::Attribute(_) => PointcutType::Attribute,
        }
    }

    /// 只用类模式做的粗筛
    pub fn matches_class(&self, class: &ClassInfo) -> bool {
        match self {
            LeafExpression::Execution { class: pattern, .. }
            | LeafExpression::Get { class: pattern, .. }
            | LeafExpression::Set { class: pattern, .. }
            | LeafExpression::Handler(pattern)
            | LeafExpression::Class(pattern) => pattern.matches(class),
            LeafExpression::Call(caller_side) | LeafExpression::Cflow(caller_side) => {
                caller_side.callee().matches(class)
            }
            LeafExpression::Attribute(attribute) => class.has_attribute(attribute),
        }
    }

    /// 完整匹配（类与成员）
    pub fn matches_member(&self, class: &ClassInfo, member: &MemberInfo) -> bool {
        match self {
            LeafExpression::Execution { class: pattern, member: member_pattern } => {
                pattern.matches(class) && member_pattern.matches(member)
            }
            LeafExpression::Call(caller_side) => caller_side.matches(class, member),
            LeafExpression::Get { class: pattern, field } | LeafExpression::Set { class: pattern, field } => {
                member.is_field() && pattern.matches(class) && field.matches(member)
            }
            // 异常处理器连接点没有成员
            LeafExpression::Handler(_) => false,
            LeafExpression::Cflow(caller_side) => {
                member.is_method() && caller_side.callee().matches(class) && caller_side.matches(class, member)
            }
            LeafExpression::Class(pattern) => pattern.matches(class),
            LeafExpression::Attribute(attribute) => {
                class.has_attribute(attribute) || member.has_attribute(attribute)
            }
        }
    }

    /// 带异常类型的匹配，只有 execution 与 call 会检查 throws 子句
    pub fn matches_exception(&self, class: &ClassInfo, member: &MemberInfo, exception_type: &str) -> bool {
        if !self.matches_member(class, member) {
            return false;
        }
        match self {
            LeafExpression::Execution { member: member_pattern, .. } => {
                member_pattern.matches_exception(exception_type)
            }
            LeafExpression::Call(caller_side) => caller_side.member().matches_exception(exception_type),
            _ => true,
        }
    }

    /// 按上下文中是否有成员、异常分派到对应的匹配方法
    pub fn matches(&self, ctx: &ExpressionContext<'_>) -> bool {
        match (ctx.member(), ctx.exception_type()) {
            (None, _) => self.matches_class(ctx.class()),
            (Some(member), None) => self.matches_member(ctx.class(), member),
            (Some(member), Some(exception_type)) => self.matches_exception(ctx.class(), member, exception_type),
        }
    }
}

fn compile_attribute(text: &str) -> PointcutResult<LeafExpression> {
    let name = text.trim();
    let name = name.strip_prefix('@').unwrap_or(name);
    if name.is_empty() {
        return Err(PointcutError::pattern(text, "empty attribute name"));
    }
    if name.contains(char::is_whitespace) {
        return Err(PointcutError::pattern(text, "attribute name must not contain whitespace"));
    }
    Ok(LeafExpression::Attribute(name.to_string()))
}
