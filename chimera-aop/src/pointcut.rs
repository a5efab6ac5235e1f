//! 切点类型
//!
//! 切点类型决定从表达式文本编译出哪一种模式，以及使用哪一种匹配语义

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// 切点类型（封闭枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointcutType {
    /// 方法或构造器执行
    Execution,
    /// 方法或构造器调用（调用方视角）
    Call,
    /// 字段写入
    Set,
    /// 字段读取
    Get,
    /// 异常处理器入口
    Handler,
    /// 控制流
    Cflow,
    /// 类
    Class,
    /// 自定义属性（注解）
    Attribute,
}

impl PointcutType {
    pub const ALL: [PointcutType; 8] = [
        PointcutType::Execution,
        PointcutType::Call,
        PointcutType::Set,
        PointcutType::Get,
        PointcutType::Handler,
        PointcutType::Cflow,
        PointcutType::Class,
        PointcutType::Attribute,
    ];

    /// 表达式中使用的关键字，例如 `execution`
    pub fn keyword(self) -> &'static str {
        match self {
            PointcutType::Execution => "execution",
            PointcutType::Call => "call",
            PointcutType::Set => "set",
            PointcutType::Get => "get",
            PointcutType::Handler => "handler",
            PointcutType::Cflow => "cflow",
            PointcutType::Class => "class",
            PointcutType::Attribute => "attribute",
        }
    }

    /// 中性类型可以和任意其他类型的叶子组合
    ///
    /// `class` 与 `attribute` 只约束类或注解，不会改变组合表达式的类型
    pub fn is_neutral(self) -> bool {
        matches!(self, PointcutType::Class | PointcutType::Attribute)
    }

    /// 该类型的模式是否包含 throws 子句
    pub fn allows_exceptions(self) -> bool {
        matches!(self, PointcutType::Execution | PointcutType::Call)
    }
}

impl FromStr for PointcutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        PointcutType::ALL
            .iter()
            .copied()
            .find(|t| t.keyword() == lower)
            .ok_or_else(|| format!("Invalid pointcut type: {}", s))
    }
}

impl fmt::Display for PointcutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().to_uppercase())
    }
}
