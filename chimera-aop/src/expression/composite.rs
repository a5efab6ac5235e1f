//! 组合表达式：绑定引用、推断类型、分离 cflow 部分
//!
//! 主布尔代数中 cflow 节点是恒为 `true` 的占位符，照常参与 AND/OR/NOT。
//! cflow 部分单独收集，由 [`CompositeExpression::match_in_or_not_in`] 求值。

use super::ast::Ast;
use super::parser;
use super::Expression;
use crate::error::{PointcutError, PointcutResult};
use crate::joinpoint::ExpressionContext;
use crate::namespace::ExpressionNamespace;
use crate::pointcut::PointcutType;
use std::sync::Arc;

/// 从组合表达式中分离出来的 cflow 子表达式
#[derive(Debug, Clone)]
pub struct CflowPart {
    expression: Arc<Expression>,
    negated: bool,
}

impl CflowPart {
    pub fn expression(&self) -> &Arc<Expression> {
        &self.expression
    }

    /// `NOT IN` 或处于奇数个 NOT 之下
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    fn same_expression(&self, other: &Arc<Expression>) -> bool {
        Arc::ptr_eq(&self.expression, other)
            || (self.expression.namespace() == other.namespace()
                && self.expression.name() == other.name()
                && self.expression.text() == other.text())
    }
}

#[derive(Debug)]
enum Node {
    Expr(Arc<Expression>),
    Cflow,
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    In(Box<Node>),
}

impl Node {
    fn evaluate(&self, ctx: &ExpressionContext<'_>) -> bool {
        match self {
            Node::Expr(expression) => expression.evaluate(ctx),
            Node::Cflow => true,
            Node::Not(inner) => !inner.evaluate(ctx),
            Node::And(left, right) => left.evaluate(ctx) && right.evaluate(ctx),
            Node::Or(left, right) => left.evaluate(ctx) || right.evaluate(ctx),
            Node::In(subject) => subject.evaluate(ctx),
        }
    }
}

/// 组合表达式
#[derive(Debug)]
pub struct CompositeExpression {
    ast: Ast,
    root: Node,
    cflow: Option<CflowPart>,
}

impl CompositeExpression {
    /// 解析并绑定组合表达式，返回表达式与推断出的切点类型
    ///
    /// 所有引用在此时解析，之后命名空间中的变化不会影响已构建的表达式。
    pub fn build(
        text: &str,
        namespace: &ExpressionNamespace,
        package: Option<&str>,
        declared: Option<PointcutType>,
    ) -> PointcutResult<(Self, PointcutType)> {
        let ast = parser::parse(text)?;
        let mut binder = Binder::new(text, namespace, package);
        let root = binder.bind(&ast, false)?;
        let pointcut_type = resolve_type(text, &binder.primary_types, declared)?;

        tracing::trace!(
            "Bound composite expression '{}' as {} (cflow: {})",
            text,
            pointcut_type,
            binder.cflow.is_some()
        );

        let composite = Self {
            ast,
            root,
            cflow: binder.cflow,
        };
        Ok((composite, pointcut_type))
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// 主布尔代数求值，cflow 部分视为 `true`
    pub fn evaluate(&self, ctx: &ExpressionContext<'_>) -> bool {
        self.root.evaluate(ctx)
    }

    /// 只对分离出的 cflow 部分求值，没有 cflow 部分时为 `false`
    pub fn match_in_or_not_in(&self, ctx: &ExpressionContext<'_>) -> bool {
        self.cflow
            .iter()
            .any(|part| part.expression.evaluate(ctx))
    }

    pub fn has_cflow(&self) -> bool {
        self.cflow.is_some()
    }

    pub fn cflow_part(&self) -> Option<&CflowPart> {
        self.cflow.as_ref()
    }
}

/// 推断表达式文本隐含的切点类型
///
/// cflow 部分不参与推断；CLASS 与 ATTRIBUTE 可以与任何类型组合。
pub fn determine_type(
    text: &str,
    namespace: &ExpressionNamespace,
    package: Option<&str>,
) -> PointcutResult<PointcutType> {
    CompositeExpression::build(text, namespace, package, None).map(|(_, pointcut_type)| pointcut_type)
}

fn resolve_type(
    text: &str,
    types: &[PointcutType],
    declared: Option<PointcutType>,
) -> PointcutResult<PointcutType> {
    // ATTRIBUTE 让位于 CLASS，二者都让位于具体类型
    let rank = |pointcut_type: PointcutType| match pointcut_type {
        PointcutType::Attribute => 0,
        PointcutType::Class => 1,
        _ => 2,
    };

    let mut inferred: Option<PointcutType> = None;
    for &candidate in types {
        inferred = match inferred {
            None => Some(candidate),
            Some(current) if current == candidate => Some(current),
            Some(current) if rank(current) == 2 && rank(candidate) == 2 => {
                return Err(PointcutError::IncompatibleTypes {
                    expression: text.to_string(),
                    first: current,
                    second: candidate,
                })
            }
            Some(current) if rank(candidate) > rank(current) => Some(candidate),
            Some(current) => Some(current),
        };
    }

    let Some(inferred) = inferred else {
        return Err(PointcutError::NoPrimaryLeaf {
            expression: text.to_string(),
        });
    };

    match declared {
        None => Ok(inferred),
        Some(declared) if declared == inferred => Ok(declared),
        Some(declared) if inferred.is_neutral() && declared != PointcutType::Cflow => Ok(declared),
        Some(declared) => Err(PointcutError::IncompatibleTypes {
            expression: text.to_string(),
            first: declared,
            second: inferred,
        }),
    }
}

struct Binder<'a> {
    text: &'a str,
    namespace: &'a ExpressionNamespace,
    package: Option<&'a str>,
    primary_types: Vec<PointcutType>,
    cflow: Option<CflowPart>,
}

impl<'a> Binder<'a> {
    fn new(text: &'a str, namespace: &'a ExpressionNamespace, package: Option<&'a str>) -> Self {
        Self {
            text,
            namespace,
            package,
            primary_types: Vec::new(),
            cflow: None,
        }
    }

    /// `negated` 为当前节点之上 NOT 的奇偶性
    fn bind(&mut self, ast: &Ast, negated: bool) -> PointcutResult<Node> {
        match ast {
            Ast::Reference(_) | Ast::Leaf { .. } => {
                let expression = self.operand(ast)?;
                self.node_for(expression, negated)
            }
            Ast::Not(inner) => Ok(Node::Not(Box::new(self.bind(inner, !negated)?))),
            Ast::And(left, right) => Ok(Node::And(
                Box::new(self.bind(left, negated)?),
                Box::new(self.bind(right, negated)?),
            )),
            Ast::Or(left, right) => Ok(Node::Or(
                Box::new(self.bind(left, negated)?),
                Box::new(self.bind(right, negated)?),
            )),
            Ast::In {
                subject,
                cflow,
                negated: not_in,
            } => {
                let subject = self.bind(subject, negated)?;
                let cflow_expression = self.operand(cflow)?;
                if cflow_expression.pointcut_type() != PointcutType::Cflow {
                    return Err(PointcutError::expression(
                        self.text,
                        format!(
                            "operand '{}' of IN must be a CFLOW pointcut, found {}",
                            cflow,
                            cflow_expression.pointcut_type()
                        ),
                    ));
                }
                self.add_cflow(cflow_expression, negated ^ *not_in)?;
                Ok(Node::In(Box::new(subject)))
            }
        }
    }

    /// 解析引用或编译内联叶子
    fn operand(&self, ast: &Ast) -> PointcutResult<Arc<Expression>> {
        match ast {
            Ast::Reference(name) => {
                self.namespace
                    .get(name)
                    .ok_or_else(|| PointcutError::UnresolvedReference {
                        name: name.clone(),
                        namespace: self.namespace.name().to_string(),
                        expression: self.text.to_string(),
                    })
            }
            Ast::Leaf { pointcut_type, pattern } => {
                let name = format!("{}({})", pointcut_type.keyword(), pattern);
                let leaf = Expression::leaf(name, self.namespace.name(), pattern, self.package, *pointcut_type)?;
                Ok(Arc::new(leaf))
            }
            other => Err(PointcutError::expression(
                self.text,
                format!("expected a pointcut reference but found '{}'", other),
            )),
        }
    }

    fn node_for(&mut self, expression: Arc<Expression>, negated: bool) -> PointcutResult<Node> {
        if expression.pointcut_type() == PointcutType::Cflow {
            self.add_cflow(expression, negated)?;
            return Ok(Node::Cflow);
        }

        self.primary_types.push(expression.pointcut_type());
        if let Some(part) = expression.cflow_part() {
            self.add_cflow(part.expression.clone(), part.negated ^ negated)?;
        }
        Ok(Node::Expr(expression))
    }

    fn add_cflow(&mut self, expression: Arc<Expression>, negated: bool) -> PointcutResult<()> {
        if let Some(existing) = &self.cflow {
            if existing.same_expression(&expression) && existing.negated == negated {
                return Ok(());
            }
            return Err(PointcutError::ComplexCflowUnsupported {
                expression: self.text.to_string(),
            });
        }
        self.cflow = Some(CflowPart { expression, negated });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassInfo, MemberInfo};

    fn namespace() -> ExpressionNamespace {
        let namespace = ExpressionNamespace::new("test");
        namespace
            .define("* com.foo.Bar.*(..)", None, "barMethods", Some(PointcutType::Execution))
            .unwrap();
        namespace
            .define("* com.foo.*.get*(..)", None, "getters", Some(PointcutType::Execution))
            .unwrap();
        namespace
            .define("Cacheable", None, "cached", Some(PointcutType::Attribute))
            .unwrap();
        namespace
            .define("com.foo.Job#run(..)", None, "inJob", Some(PointcutType::Cflow))
            .unwrap();
        namespace
            .define("com.foo.Other#run(..)", None, "inOther", Some(PointcutType::Cflow))
            .unwrap();
        namespace
            .define("* com.foo.Bar#*(..)", None, "barCalls", Some(PointcutType::Call))
            .unwrap();
        namespace
    }

    fn build(namespace: &ExpressionNamespace, text: &str) -> PointcutResult<(CompositeExpression, PointcutType)> {
        CompositeExpression::build(text, namespace, None, None)
    }

    #[test]
    fn test_evaluate_algebra() {
        let namespace = namespace();
        let class = ClassInfo::new("com.foo.Bar");
        let get_name = MemberInfo::method("com.foo.Bar", "getName");
        let run = MemberInfo::method("com.foo.Bar", "run");
        let ctx_get = ExpressionContext::with_member(PointcutType::Execution, &class, &get_name);
        let ctx_run = ExpressionContext::with_member(PointcutType::Execution, &class, &run);

        let (and, pointcut_type) = build(&namespace, "barMethods AND getters").unwrap();
        assert_eq!(pointcut_type, PointcutType::Execution);
        assert!(and.evaluate(&ctx_get));
        assert!(!and.evaluate(&ctx_run));

        let (and_not, _) = build(&namespace, "barMethods AND NOT getters").unwrap();
        assert!(!and_not.evaluate(&ctx_get));
        assert!(and_not.evaluate(&ctx_run));
    }

    #[test]
    fn test_neutral_types() {
        let namespace = namespace();
        let (_, pointcut_type) = build(&namespace, "barMethods AND NOT cached").unwrap();
        assert_eq!(pointcut_type, PointcutType::Execution);

        let (_, pointcut_type) = build(&namespace, "class(com.foo.*) AND cached").unwrap();
        assert_eq!(pointcut_type, PointcutType::Class);

        let (_, pointcut_type) = build(&namespace, "cached").unwrap();
        assert_eq!(pointcut_type, PointcutType::Attribute);
    }

    #[test]
    fn test_incompatible_types() {
        let namespace = namespace();
        let err = build(&namespace, "barMethods OR barCalls").unwrap_err();
        assert!(matches!(
            err,
            PointcutError::IncompatibleTypes {
                first: PointcutType::Execution,
                second: PointcutType::Call,
                ..
            }
        ));

        let err = CompositeExpression::build("barMethods", &namespace, None, Some(PointcutType::Call)).unwrap_err();
        assert!(matches!(err, PointcutError::IncompatibleTypes { .. }));
    }

    #[test]
    fn test_unresolved_reference() {
        let namespace = namespace();
        let err = build(&namespace, "barMethods AND missing").unwrap_err();
        match err {
            PointcutError::UnresolvedReference { name, namespace, expression } => {
                assert_eq!(name, "missing");
                assert_eq!(namespace, "test");
                assert_eq!(expression, "barMethods AND missing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_cflow_isolation() {
        let namespace = namespace();
        let class = ClassInfo::new("com.foo.Bar");
        let run = MemberInfo::method("com.foo.Bar", "run");
        let ctx = ExpressionContext::with_member(PointcutType::Execution, &class, &run);

        let (in_flow, _) = build(&namespace, "barMethods IN inJob").unwrap();
        assert!(in_flow.has_cflow());
        assert!(!in_flow.cflow_part().unwrap().is_negated());
        // cflow 部分不影响主求值
        assert!(in_flow.evaluate(&ctx));
        assert!(!in_flow.match_in_or_not_in(&ctx));

        let job = ClassInfo::new("com.foo.Job");
        let job_run = MemberInfo::method("com.foo.Job", "run");
        let frame = ExpressionContext::with_member(PointcutType::Cflow, &job, &job_run);
        assert!(in_flow.match_in_or_not_in(&frame));

        let (plain, _) = build(&namespace, "barMethods OR getters").unwrap();
        assert!(!plain.has_cflow());
        assert!(!plain.match_in_or_not_in(&frame));
    }

    #[test]
    fn test_bare_cflow_reference_is_true_placeholder() {
        let namespace = namespace();
        let baz = ClassInfo::new("com.foo.Baz");
        let baz_x = MemberInfo::method("com.foo.Baz", "x");
        let ctx_baz = ExpressionContext::with_member(PointcutType::Execution, &baz, &baz_x);
        let bar = ClassInfo::new("com.foo.Bar");
        let run = MemberInfo::method("com.foo.Bar", "run");
        let ctx_run = ExpressionContext::with_member(PointcutType::Execution, &bar, &run);

        let (or, _) = build(&namespace, "barMethods OR inJob").unwrap();
        assert!(or.evaluate(&ctx_baz));
        assert!(or.has_cflow());

        let (and_not, _) = build(&namespace, "barMethods AND NOT inJob").unwrap();
        assert!(!and_not.evaluate(&ctx_run));
        assert!(and_not.cflow_part().unwrap().is_negated());

        let (and, _) = build(&namespace, "barMethods AND inJob").unwrap();
        assert!(and.evaluate(&ctx_run));
        assert!(!and.evaluate(&ctx_baz));
    }

    #[test]
    fn test_cflow_polarity() {
        let namespace = namespace();
        let (not_in, _) = build(&namespace, "barMethods NOT IN inJob").unwrap();
        assert!(not_in.cflow_part().unwrap().is_negated());

        let (negated, _) = build(&namespace, "NOT (barMethods IN inJob)").unwrap();
        assert!(negated.cflow_part().unwrap().is_negated());

        let (inline, _) = build(&namespace, "barMethods IN cflow(com.foo.Job#run(..))").unwrap();
        assert_eq!(inline.cflow_part().unwrap().expression().name(), "cflow(com.foo.Job#run(..))");
    }

    #[test]
    fn test_nested_composite_inherits_cflow() {
        let namespace = namespace();
        namespace
            .define("barMethods IN inJob", None, "barInJob", None)
            .unwrap();

        let (outer, _) = build(&namespace, "barInJob AND NOT getters").unwrap();
        assert!(outer.has_cflow());
        assert!(!outer.cflow_part().unwrap().is_negated());

        let (repeated, _) = build(&namespace, "barInJob OR (getters IN inJob)").unwrap();
        assert!(repeated.has_cflow());
    }

    #[test]
    fn test_complex_cflow_rejected() {
        let namespace = namespace();
        let err = build(&namespace, "barMethods IN inJob AND getters IN inOther").unwrap_err();
        assert!(matches!(err, PointcutError::ComplexCflowUnsupported { .. }));

        let err = build(&namespace, "barMethods IN inJob OR getters NOT IN inJob").unwrap_err();
        assert!(matches!(err, PointcutError::ComplexCflowUnsupported { .. }));
    }

    #[test]
    fn test_in_operand_must_be_cflow() {
        let namespace = namespace();
        let err = build(&namespace, "barMethods IN getters").unwrap_err();
        assert!(matches!(err, PointcutError::ExpressionSyntax { .. }));

        let err = build(&namespace, "barMethods IN (inJob OR inOther)").unwrap_err();
        assert!(matches!(err, PointcutError::ExpressionSyntax { .. }));
    }

    #[test]
    fn test_cflow_only_expression_rejected() {
        let namespace = namespace();
        let err = build(&namespace, "inJob").unwrap_err();
        assert!(matches!(err, PointcutError::NoPrimaryLeaf { .. }));
    }

    #[test]
    fn test_determine_type() {
        let namespace = namespace();
        assert_eq!(
            determine_type("barMethods OR execution(* com.foo.Baz.*(..))", &namespace, None).unwrap(),
            PointcutType::Execution
        );
        assert_eq!(
            determine_type("barCalls IN inJob", &namespace, None).unwrap(),
            PointcutType::Call
        );
    }
}
