//! 模式文本分段
//!
//! `[修饰符...] [类型] 限定名[(参数)] [throws 异常, ...]`

use crate::metadata::Modifiers;

/// 分段结果，所有切片都借用自原始文本
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Segments<'a> {
    pub modifiers: Vec<&'a str>,
    pub type_token: Option<&'a str>,
    pub qualified_name: &'a str,
    pub parameters: Option<&'a str>,
    pub throws: Vec<&'a str>,
}

/// 拆分模式文本
///
/// `with_parameters` 为 true 时要求有且只有一对括号（方法、构造器）；
/// 为 false 时不允许出现括号（类、字段）
pub(crate) fn split(text: &str, with_parameters: bool) -> Result<Segments<'_>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty pattern".to_string());
    }

    let (head, parameters, tail) = if with_parameters {
        let open = text.find('(').ok_or("missing parameter list")?;
        let after_open = &text[open + 1..];
        let close = match (after_open.find('('), after_open.find(')')) {
            (_, None) => return Err("unbalanced parentheses".to_string()),
            (Some(nested), Some(close)) if nested < close => {
                return Err("nested parentheses in parameter list".to_string())
            }
            (_, Some(close)) => close,
        };
        let head = &text[..open];
        let tail = &after_open[close + 1..];
        if head.contains(')') || tail.contains('(') || tail.contains(')') {
            return Err("unbalanced parentheses".to_string());
        }
        (head.trim_end(), Some(&after_open[..close]), tail.trim())
    } else {
        if text.contains('(') || text.contains(')') {
            return Err("unexpected parentheses".to_string());
        }
        (text, None, "")
    };

    let throws = split_throws(tail)?;

    let mut tokens: Vec<&str> = head.split_whitespace().collect();
    let qualified_name = tokens.pop().ok_or("empty name")?;

    let modifier_count = tokens
        .iter()
        .take_while(|token| {
            token.starts_with('!') || Modifiers::from_keyword(token).is_some()
        })
        .count();
    let type_tokens = tokens.split_off(modifier_count);
    let type_token = match type_tokens.as_slice() {
        [] => None,
        [single] => Some(*single),
        [_, unexpected, ..] => return Err(format!("unexpected token '{}'", unexpected)),
    };

    Ok(Segments {
        modifiers: tokens,
        type_token,
        qualified_name,
        parameters,
        throws,
    })
}

fn split_throws(tail: &str) -> Result<Vec<&str>, String> {
    if tail.is_empty() {
        return Ok(Vec::new());
    }
    let list = tail
        .strip_prefix("throws")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .ok_or_else(|| format!("unexpected trailing text '{}'", tail))?;

    list.split(',')
        .map(|exception| match exception.trim() {
            "" => Err("empty exception type in throws clause".to_string()),
            exception => Ok(exception),
        })
        .collect()
}

/// 拆分限定名为（类名，成员名）
///
/// 调用方视角的模式优先使用 `#` 作为分隔符，否则取最后一个 `.`；
/// 没有分隔符时类名为 `None`（任意类）
pub(crate) fn split_member_name(qualified: &str, caller_side: bool) -> Result<(Option<&str>, &str), String> {
    let split = if caller_side && qualified.contains('#') {
        qualified.split_once('#')
    } else {
        qualified.rfind('.').map(|idx| (&qualified[..idx], &qualified[idx + 1..]))
    };

    match split {
        Some(("", _)) => Err("empty class name".to_string()),
        Some((_, "")) => Err("empty member name".to_string()),
        Some((class, member)) => Ok((Some(class), member)),
        None => Ok((None, qualified)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_full_method() {
        let segments = split(
            "public static void com.foo.Bar.doIt(int, ..) throws java.io.IOException, *Exception",
            true,
        )
        .unwrap();
        assert_eq!(segments.modifiers, vec!["public", "static"]);
        assert_eq!(segments.type_token, Some("void"));
        assert_eq!(segments.qualified_name, "com.foo.Bar.doIt");
        assert_eq!(segments.parameters, Some("int, .."));
        assert_eq!(segments.throws, vec!["java.io.IOException", "*Exception"]);
    }

    #[test]
    fn test_split_minimal_method() {
        let segments = split("  com.foo.Bar+.doIt(..)  ", true).unwrap();
        assert!(segments.modifiers.is_empty());
        assert_eq!(segments.type_token, None);
        assert_eq!(segments.qualified_name, "com.foo.Bar+.doIt");
        assert_eq!(segments.parameters, Some(".."));
    }

    #[test]
    fn test_split_field() {
        let segments = split("private !static int com.foo.Bar.count", false).unwrap();
        assert_eq!(segments.modifiers, vec!["private", "!static"]);
        assert_eq!(segments.type_token, Some("int"));
        assert_eq!(segments.qualified_name, "com.foo.Bar.count");
        assert_eq!(segments.parameters, None);
    }

    #[test]
    fn test_split_errors() {
        assert!(split("", true).is_err());
        assert!(split("* Foo.bar(", true).is_err());
        assert!(split("* Foo.bar)", true).is_err());
        assert!(split("* Foo.bar((int))", true).is_err());
        assert!(split("* Foo.bar(int))", true).is_err());
        assert!(split("* Foo.bar", true).is_err());
        assert!(split("* Foo.bar(..) throw X", true).is_err());
        assert!(split("* Foo.bar(..) throws", true).is_err());
        assert!(split("* Foo.bar(..) throws A,", true).is_err());
        assert!(split("int Foo.bar()", false).is_err());
        assert!(split("public int long Foo.bar", false).is_err());
    }

    #[test]
    fn test_split_member_name() {
        assert_eq!(
            split_member_name("com.foo.Bar.doIt", false).unwrap(),
            (Some("com.foo.Bar"), "doIt")
        );
        assert_eq!(
            split_member_name("com.foo.Bar#doIt", true).unwrap(),
            (Some("com.foo.Bar"), "doIt")
        );
        assert_eq!(
            split_member_name("com.foo.Bar.doIt", true).unwrap(),
            (Some("com.foo.Bar"), "doIt")
        );
        assert_eq!(split_member_name("doIt", false).unwrap(), (None, "doIt"));
        assert!(split_member_name(".doIt", false).is_err());
        assert!(split_member_name("com.foo.Bar.", false).is_err());
        assert!(split_member_name("#doIt", true).is_err());
    }
}
