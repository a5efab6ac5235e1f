//! 模式编译器
//!
//! 把单个模式字符串（例如 `public * com.foo.Bar+.doX(..)`）编译为结构化的匹配器。
//! 编译是输入文本与默认包名的纯函数，编译结果不可变。
//!
//! | 切点类型 | 模式 |
//! |---|---|
//! | execution | `[修饰符] [返回类型] 类.方法(参数) [throws ...]`，方法名为 `new` 时是构造器 |
//! | call | `[修饰符] [返回类型] 被调用类#方法(参数) [throws ...]` |
//! | cflow | `[修饰符] [返回类型] 类#方法(参数)` |
//! | get / set | `[修饰符] [字段类型] 类.字段` |
//! | handler / class | `[修饰符] 类` |

mod name;
mod parser;
mod signature;

pub use name::{ClassPattern, ModifierPattern, NamePattern, TypePattern};
pub use signature::{
    CallerSidePattern, ConstructorPattern, FieldPattern, MemberPattern, MethodPattern,
    ParameterMatcher, ParameterPattern,
};

use crate::error::{PointcutError, PointcutResult};
use crate::pointcut::PointcutType;

/// 构造器的成员名
pub const CONSTRUCTOR_MARKER: &str = "new";

/// 编译后的模式
#[derive(Debug, Clone)]
pub enum Pattern {
    Class(ClassPattern),
    Method {
        declaring_type: ClassPattern,
        method: MethodPattern,
    },
    Constructor {
        declaring_type: ClassPattern,
        constructor: ConstructorPattern,
    },
    Field {
        declaring_type: ClassPattern,
        field: FieldPattern,
    },
    CallerSide(CallerSidePattern),
}

impl Pattern {
    /// 按切点类型编译模式
    ///
    /// `package` 是默认包名，用于补全不带包名的类名
    pub fn compile(text: &str, package: Option<&str>, pointcut_type: PointcutType) -> PointcutResult<Self> {
        let compiled = match pointcut_type {
            PointcutType::Execution => compile_member(text, package, true),
            PointcutType::Call => compile_caller_side(text, package, true),
            PointcutType::Cflow => compile_caller_side(text, package, false),
            PointcutType::Get | PointcutType::Set => compile_field(text, package),
            PointcutType::Handler | PointcutType::Class => compile_class(text, package),
            PointcutType::Attribute => Err("attribute expressions are not patterns".to_string()),
        };

        compiled
            .map(|pattern| {
                tracing::trace!("Compiled {} pattern '{}'", pointcut_type, text.trim());
                pattern
            })
            .map_err(|reason| PointcutError::pattern(text, reason))
    }

    /// 声明类（或被调用类）的模式
    pub fn class_pattern(&self) -> &ClassPattern {
        match self {
            Pattern::Class(class) => class,
            Pattern::Method { declaring_type, .. }
            | Pattern::Constructor { declaring_type, .. }
            | Pattern::Field { declaring_type, .. } => declaring_type,
            Pattern::CallerSide(caller_side) => caller_side.callee(),
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        self.class_pattern().is_hierarchical()
    }

    /// 拆分为类模式与成员模式
    pub fn into_parts(self) -> (ClassPattern, Option<MemberPattern>) {
        match self {
            Pattern::Class(class) => (class, None),
            Pattern::Method { declaring_type, method } => (declaring_type, Some(MemberPattern::Method(method))),
            Pattern::Constructor {
                declaring_type,
                constructor,
            } => (declaring_type, Some(MemberPattern::Constructor(constructor))),
            Pattern::Field { declaring_type, field } => (declaring_type, Some(MemberPattern::Field(field))),
            Pattern::CallerSide(caller_side) => (caller_side.callee, Some(caller_side.member)),
        }
    }
}

fn compile_exceptions(throws: &[&str], allowed: bool) -> Result<Vec<TypePattern>, String> {
    if !throws.is_empty() && !allowed {
        return Err("throws clause is only allowed in execution and call patterns".to_string());
    }
    throws.iter().map(|exception| TypePattern::compile(exception)).collect()
}

fn compile_declaring_type(class: Option<&str>, package: Option<&str>) -> Result<ClassPattern, String> {
    match class {
        Some(class) => ClassPattern::compile(class, package),
        None => Ok(ClassPattern::any()),
    }
}

/// 方法或构造器（由成员名决定）
fn compile_member_pattern(
    segments: &parser::Segments<'_>,
    member_name: &str,
    allow_exceptions: bool,
) -> Result<MemberPattern, String> {
    let modifiers = ModifierPattern::compile(&segments.modifiers)?;
    let parameters = ParameterPattern::compile(segments.parameters.unwrap_or(""))?;
    let exceptions = compile_exceptions(&segments.throws, allow_exceptions)?;

    if member_name == CONSTRUCTOR_MARKER {
        if let Some(ignored) = segments.type_token {
            tracing::trace!("Ignoring return type '{}' in constructor pattern", ignored);
        }
        return Ok(MemberPattern::Constructor(ConstructorPattern {
            modifiers,
            parameters,
            exceptions,
        }));
    }

    let return_type = match segments.type_token {
        Some(return_type) => TypePattern::compile(return_type)?,
        None => TypePattern::any(),
    };
    Ok(MemberPattern::Method(MethodPattern {
        modifiers,
        return_type,
        name: NamePattern::compile_member(member_name)?,
        parameters,
        exceptions,
    }))
}

fn compile_member(text: &str, package: Option<&str>, allow_exceptions: bool) -> Result<Pattern, String> {
    let segments = parser::split(text, true)?;
    let (class, member_name) = parser::split_member_name(segments.qualified_name, false)?;
    let declaring_type = compile_declaring_type(class, package)?;

    Ok(match compile_member_pattern(&segments, member_name, allow_exceptions)? {
        MemberPattern::Constructor(constructor) => Pattern::Constructor {
            declaring_type,
            constructor,
        },
        MemberPattern::Method(method) => Pattern::Method { declaring_type, method },
        MemberPattern::Field(field) => Pattern::Field { declaring_type, field },
    })
}

fn compile_caller_side(text: &str, package: Option<&str>, allow_exceptions: bool) -> Result<Pattern, String> {
    let segments = parser::split(text, true)?;
    let (class, member_name) = parser::split_member_name(segments.qualified_name, true)?;

    Ok(Pattern::CallerSide(CallerSidePattern {
        callee: compile_declaring_type(class, package)?,
        member: compile_member_pattern(&segments, member_name, allow_exceptions)?,
    }))
}

fn compile_field(text: &str, package: Option<&str>) -> Result<Pattern, String> {
    let segments = parser::split(text, false)?;
    let (class, field_name) = parser::split_member_name(segments.qualified_name, false)?;

    let field_type = match segments.type_token {
        Some(field_type) => TypePattern::compile(field_type)?,
        None => TypePattern::any(),
    };
    Ok(Pattern::Field {
        declaring_type: compile_declaring_type(class, package)?,
        field: FieldPattern {
            modifiers: ModifierPattern::compile(&segments.modifiers)?,
            field_type,
            name: NamePattern::compile_member(field_name)?,
        },
    })
}

fn compile_class(text: &str, package: Option<&str>) -> Result<Pattern, String> {
    let segments = parser::split(text, false)?;
    if let Some(unexpected) = segments.type_token {
        return Err(format!("unexpected token '{}'", unexpected));
    }
    let modifiers = ModifierPattern::compile(&segments.modifiers)?;
    Ok(Pattern::Class(
        ClassPattern::compile(segments.qualified_name, package)?.with_modifiers(modifiers),
    ))
}
