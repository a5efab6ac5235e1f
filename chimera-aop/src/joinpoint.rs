//! 连接点匹配上下文
//!
//! 每次匹配查询都会构造一个新的上下文：切点类型、类、可选的成员以及可选的异常类型

use crate::metadata::{ClassInfo, MemberInfo};
use crate::pointcut::PointcutType;
use std::fmt;

/// 连接点匹配上下文
///
/// 只借用元数据，不持有；构造成本很低
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionContext<'a> {
    pointcut_type: PointcutType,
    class: &'a ClassInfo,
    member: Option<&'a MemberInfo>,
    exception_type: Option<&'a str>,
}

impl<'a> ExpressionContext<'a> {
    /// 只包含类的上下文
    pub fn new(pointcut_type: PointcutType, class: &'a ClassInfo) -> Self {
        Self {
            pointcut_type,
            class,
            member: None,
            exception_type: None,
        }
    }

    /// 包含类与成员的上下文
    pub fn with_member(pointcut_type: PointcutType, class: &'a ClassInfo, member: &'a MemberInfo) -> Self {
        Self {
            pointcut_type,
            class,
            member: Some(member),
            exception_type: None,
        }
    }

    /// 附加异常类型名（用于 throws 匹配）
    pub fn exception(mut self, exception_type: &'a str) -> Self {
        self.exception_type = Some(exception_type);
        self
    }

    pub fn pointcut_type(&self) -> PointcutType {
        self.pointcut_type
    }

    pub fn class(&self) -> &'a ClassInfo {
        self.class
    }

    pub fn member(&self) -> Option<&'a MemberInfo> {
        self.member
    }

    pub fn exception_type(&self) -> Option<&'a str> {
        self.exception_type
    }

    /// 连接点签名，例如 `EXECUTION com.foo.Bar.doIt(int)`
    pub fn signature(&self) -> String {
        match self.member {
            Some(member) => format!("{} {}", self.pointcut_type, member),
            None => format!("{} {}", self.pointcut_type, self.class.name()),
        }
    }
}

impl fmt::Display for ExpressionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())?;
        if let Some(exception) = self.exception_type {
            write!(f, " throws {}", exception)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_signature() {
        let class = ClassInfo::new("com.foo.Bar");
        let member = MemberInfo::method("com.foo.Bar", "doIt").with_parameters(["int"]);

        let ctx = ExpressionContext::new(PointcutType::Class, &class);
        assert_eq!(ctx.signature(), "CLASS com.foo.Bar");
        assert!(ctx.member().is_none());

        let ctx = ExpressionContext::with_member(PointcutType::Execution, &class, &member)
            .exception("java.io.IOException");
        assert_eq!(ctx.signature(), "EXECUTION com.foo.Bar.doIt(int)");
        assert_eq!(
            ctx.to_string(),
            "EXECUTION com.foo.Bar.doIt(int) throws java.io.IOException"
        );
    }
}
