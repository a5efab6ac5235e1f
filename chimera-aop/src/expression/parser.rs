//! 布尔表达式解析
//!
//! ```text
//! expr    := or
//! or      := and (OR and)*
//! and     := unary (AND unary)*
//! unary   := NOT unary | postfix
//! postfix := primary ((IN | NOT IN) primary)*
//! primary := 名称 | 类型关键字 '(' 模式 ')' | '(' expr ')'
//! ```
//!
//! 运算符别名：`AND`/`and`/`&&`，`OR`/`or`/`||`，`NOT`/`not`/`!`，`IN`/`in`

use super::ast::Ast;
use crate::error::{PointcutError, PointcutResult};
use crate::pointcut::PointcutType;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Leaf(PointcutType, String),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Leaf(pointcut_type, pattern) => write!(f, "{}({})", pointcut_type.keyword(), pattern),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::In => write!(f, "IN"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// 解析布尔表达式
pub fn parse(text: &str) -> PointcutResult<Ast> {
    let tokens = tokenize(text).map_err(|reason| PointcutError::expression(text, reason))?;
    Parser { tokens, pos: 0 }
        .parse_expression()
        .map_err(|reason| PointcutError::expression(text, reason))
}

/// 判断文本看起来是否是单个叶子模式而不是对命名表达式的引用
///
/// 没有 `AND`/`OR`/`&&`/`||`，并且包含 `.`、`->` 或 `#`。
/// 这是启发式规则：不带包名、不带参数列表的类模式会被当成引用。
pub fn looks_like_leaf(text: &str) -> bool {
    let has_operator = text.contains("&&")
        || text.contains("||")
        || text
            .split_whitespace()
            .any(|word| matches!(word, "AND" | "OR" | "and" | "or"));
    !has_operator && (text.contains('.') || text.contains("->") || text.contains('#'))
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start();
        let Some(c) = rest.chars().next() else {
            break;
        };

        if let Some(tail) = rest.strip_prefix("&&") {
            tokens.push(Token::And);
            rest = tail;
            continue;
        }
        if let Some(tail) = rest.strip_prefix("||") {
            tokens.push(Token::Or);
            rest = tail;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LParen);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::RParen);
                rest = &rest[1..];
            }
            '!' => {
                tokens.push(Token::Not);
                rest = &rest[1..];
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || "()!&|".contains(c))
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(format!("unexpected character '{}'", c));
                }
                let word = &rest[..end];
                rest = &rest[end..];

                let token = match word {
                    "AND" | "and" => Token::And,
                    "OR" | "or" => Token::Or,
                    "NOT" | "not" => Token::Not,
                    "IN" | "in" => Token::In,
                    _ => match inline_leaf_type(word, rest) {
                        Some(pointcut_type) => {
                            let (pattern, tail) = scan_balanced(rest.trim_start())?;
                            rest = tail;
                            Token::Leaf(pointcut_type, pattern.trim().to_string())
                        }
                        None => Token::Ident(word.to_string()),
                    },
                };
                tokens.push(token);
            }
        }
    }

    Ok(tokens)
}

/// 关键字后紧跟 `(` 时才是内联叶子
fn inline_leaf_type(word: &str, rest: &str) -> Option<PointcutType> {
    if !rest.trim_start().starts_with('(') {
        return None;
    }
    PointcutType::ALL.iter().copied().find(|t| t.keyword() == word)
}

/// `rest` 以 `(` 开头，返回括号内的文本与剩余部分
fn scan_balanced(rest: &str) -> Result<(&str, &str), String> {
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&rest[1..idx], &rest[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    Err("unbalanced parentheses in inline pointcut".to_string())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> Result<Ast, String> {
        if self.tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let ast = self.parse_or()?;
        match self.peek() {
            None => Ok(ast),
            Some(token) => Err(format!("unexpected token '{}'", token)),
        }
    }

    fn parse_or(&mut self) -> Result<Ast, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Ast::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Ast, String> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = Ast::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Ast, String> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(Ast::not(self.parse_unary()?));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Ast, String> {
        let mut subject = self.parse_primary()?;
        loop {
            let negated = match (self.peek(), self.peek_second()) {
                (Some(Token::In), _) => false,
                (Some(Token::Not), Some(Token::In)) => true,
                _ => break,
            };
            if negated {
                self.advance();
            }
            self.advance();
            let cflow = self.parse_primary()?;
            subject = Ast::In {
                subject: Box::new(subject),
                cflow: Box::new(cflow),
                negated,
            };
        }
        Ok(subject)
    }

    fn parse_primary(&mut self) -> Result<Ast, String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Ast::Reference(name)),
            Some(Token::Leaf(pointcut_type, pattern)) => Ok(Ast::Leaf { pointcut_type, pattern }),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(format!("expected ')' but found '{}'", token)),
                    None => Err("missing ')'".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected token '{}'", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
