//! 切点表达式
//!
//! [`Expression`] 是命名空间中登记的单元：要么是一个叶子，要么是引用其它表达式的布尔组合。
//! 构建完成后所有匹配方法都是全函数，不返回错误也不会 panic。

pub mod ast;
pub mod parser;
mod composite;

pub use composite::{determine_type, CflowPart, CompositeExpression};

use crate::cflow::CflowStack;
use crate::error::PointcutResult;
use crate::joinpoint::ExpressionContext;
use crate::leaf::LeafExpression;
use crate::metadata::{ClassInfo, MemberInfo};
use crate::namespace::ExpressionNamespace;
use crate::pointcut::PointcutType;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// 每个构建出的表达式一个编号，重新定义同名表达式会得到新编号
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// 表达式的具体形式
#[derive(Debug)]
pub enum ExpressionKind {
    Leaf(LeafExpression),
    Composite(CompositeExpression),
}

/// 命名的切点表达式
#[derive(Debug)]
pub struct Expression {
    id: u64,
    name: String,
    namespace: String,
    pointcut_type: PointcutType,
    text: String,
    kind: ExpressionKind,
}

impl Expression {
    /// 编译叶子表达式
    pub fn leaf(
        name: impl Into<String>,
        namespace: impl Into<String>,
        text: &str,
        package: Option<&str>,
        pointcut_type: PointcutType,
    ) -> PointcutResult<Self> {
        let leaf = LeafExpression::compile(text, package, pointcut_type)?;
        Ok(Self {
            id: next_id(),
            name: name.into(),
            namespace: namespace.into(),
            pointcut_type,
            text: text.trim().to_string(),
            kind: ExpressionKind::Leaf(leaf),
        })
    }

    /// 构建组合表达式，引用在 `namespace` 中解析
    ///
    /// `declared` 为空时类型由引用的叶子推断
    pub fn composite(
        name: impl Into<String>,
        namespace: &ExpressionNamespace,
        text: &str,
        package: Option<&str>,
        declared: Option<PointcutType>,
    ) -> PointcutResult<Self> {
        let (composite, pointcut_type) = CompositeExpression::build(text, namespace, package, declared)?;
        Ok(Self {
            id: next_id(),
            name: name.into(),
            namespace: namespace.name().to_string(),
            pointcut_type,
            text: text.trim().to_string(),
            kind: ExpressionKind::Composite(composite),
        })
    }

    /// 进程内唯一的构建编号
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pointcut_type(&self) -> PointcutType {
        self.pointcut_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ExpressionKind::Leaf(_))
    }

    /// 按上下文匹配；上下文的切点类型必须与表达式一致（CLASS、ATTRIBUTE 除外）
    pub fn matches_context(&self, ctx: &ExpressionContext<'_>) -> bool {
        if !self.pointcut_type.is_neutral() && ctx.pointcut_type() != self.pointcut_type {
            return false;
        }
        self.evaluate(ctx)
    }

    /// 不检查切点类型的求值，组合表达式对子表达式使用
    pub(crate) fn evaluate(&self, ctx: &ExpressionContext<'_>) -> bool {
        match &self.kind {
            ExpressionKind::Leaf(leaf) => leaf.matches(ctx),
            ExpressionKind::Composite(composite) => composite.evaluate(ctx),
        }
    }

    /// 只按类匹配
    pub fn matches_class(&self, class: &ClassInfo) -> bool {
        self.evaluate(&ExpressionContext::new(self.pointcut_type, class))
    }

    /// 按类与成员匹配
    pub fn matches(&self, class: &ClassInfo, member: &MemberInfo) -> bool {
        self.evaluate(&ExpressionContext::with_member(self.pointcut_type, class, member))
    }

    /// 按类、成员与抛出的异常类型匹配
    pub fn matches_with_exception(&self, class: &ClassInfo, member: &MemberInfo, exception_type: &str) -> bool {
        let ctx = ExpressionContext::with_member(self.pointcut_type, class, member).exception(exception_type);
        self.evaluate(&ctx)
    }

    /// 是否包含 cflow 部分（cflow 叶子本身也算）
    pub fn has_cflow(&self) -> bool {
        match &self.kind {
            ExpressionKind::Leaf(leaf) => leaf.pointcut_type() == PointcutType::Cflow,
            ExpressionKind::Composite(composite) => composite.has_cflow(),
        }
    }

    /// 组合表达式中分离出的 cflow 部分
    pub fn cflow_part(&self) -> Option<&CflowPart> {
        match &self.kind {
            ExpressionKind::Leaf(_) => None,
            ExpressionKind::Composite(composite) => composite.cflow_part(),
        }
    }

    /// cflow 部分是否以 `NOT IN` 的方式参与
    pub fn cflow_negated(&self) -> bool {
        self.cflow_part().is_some_and(CflowPart::is_negated)
    }

    /// 只对 IN / NOT IN 部分求值；叶子表达式总是 `false`
    pub fn match_in_or_not_in(&self, ctx: &ExpressionContext<'_>) -> bool {
        match &self.kind {
            ExpressionKind::Leaf(_) => false,
            ExpressionKind::Composite(composite) => composite.match_in_or_not_in(ctx),
        }
    }

    /// 用 cflow 部分匹配一个控制流帧
    pub fn match_cflow(&self, ctx: &ExpressionContext<'_>) -> bool {
        match &self.kind {
            ExpressionKind::Leaf(leaf) if leaf.pointcut_type() == PointcutType::Cflow => leaf.matches(ctx),
            ExpressionKind::Leaf(_) => false,
            ExpressionKind::Composite(composite) => composite.match_in_or_not_in(ctx),
        }
    }

    /// 主匹配结果与控制流判断的组合
    ///
    /// `IN` 要求当前处于 cflow 之内，`NOT IN` 要求不在其中
    pub fn matches_with_cflow(&self, ctx: &ExpressionContext<'_>, stack: &CflowStack) -> bool {
        if self.pointcut_type == PointcutType::Cflow {
            return stack.is_in_control_flow_of(self);
        }
        let primary = self.matches_context(ctx);
        if !primary || !self.has_cflow() {
            return primary;
        }
        stack.is_in_control_flow_of(self) != self.cflow_negated()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} = {}", self.namespace, self.name, self.text)
    }
}
