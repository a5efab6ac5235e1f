//! 布尔表达式语法树

use crate::pointcut::PointcutType;
use std::fmt;

/// 解析得到的语法树，引用尚未绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// 命名引用
    Reference(String),
    /// 内联叶子，例如 `execution(* com.foo.Bar.*(..))`
    Leaf {
        pointcut_type: PointcutType,
        pattern: String,
    },
    Not(Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    /// `subject IN cflow` / `subject NOT IN cflow`
    In {
        subject: Box<Ast>,
        cflow: Box<Ast>,
        negated: bool,
    },
}

impl Ast {
    pub fn not(inner: Ast) -> Self {
        Ast::Not(Box::new(inner))
    }

    pub fn and(left: Ast, right: Ast) -> Self {
        Ast::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Ast, right: Ast) -> Self {
        Ast::Or(Box::new(left), Box::new(right))
    }

    /// 所有命名引用（按出现顺序，可能重复）
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Ast::Reference(name) => names.push(name),
            Ast::Leaf { .. } => {}
            Ast::Not(inner) => inner.collect_references(names),
            Ast::And(left, right) | Ast::Or(left, right) => {
                left.collect_references(names);
                right.collect_references(names);
            }
            Ast::In { subject, cflow, .. } => {
                subject.collect_references(names);
                cflow.collect_references(names);
            }
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Reference(name) => write!(f, "{}", name),
            Ast::Leaf { pointcut_type, pattern } => write!(f, "{}({})", pointcut_type.keyword(), pattern),
            Ast::Not(inner) => write!(f, "NOT {}", inner),
            Ast::And(left, right) => write!(f, "({} AND {})", left, right),
            Ast::Or(left, right) => write!(f, "({} OR {})", left, right),
            Ast::In { subject, cflow, negated } => {
                let op = if *negated { "NOT IN" } else { "IN" };
                write!(f, "({} {} {})", subject, op, cflow)
            }
        }
    }
}
