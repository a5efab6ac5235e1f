//! 类型层次遍历
//!
//! 顺序：类本身，然后深度优先遍历声明的接口（包括接口的父接口），最后递归父类。
//! 以类名为键记录已访问的类型，同名类型只访问一次。

use crate::metadata::ClassInfo;
use std::collections::HashSet;

/// 层次结构中是否存在满足条件的类型（包括类本身）
pub fn any_in_hierarchy<F>(class: &ClassInfo, mut predicate: F) -> bool
where
    F: FnMut(&ClassInfo) -> bool,
{
    let mut visited = HashSet::new();
    visit(class, &mut predicate, &mut visited)
}

fn visit<'a, F>(class: &'a ClassInfo, predicate: &mut F, visited: &mut HashSet<&'a str>) -> bool
where
    F: FnMut(&ClassInfo) -> bool,
{
    if !visited.insert(class.name()) {
        tracing::trace!("Type '{}' already visited in hierarchy walk", class.name());
        return false;
    }

    if predicate(class) {
        return true;
    }

    if class
        .interfaces()
        .iter()
        .any(|interface| visit(interface, predicate, visited))
    {
        return true;
    }

    match class.superclass() {
        Some(superclass) => visit(superclass, predicate, visited),
        None => false,
    }
}

/// 按遍历顺序列出层次结构中的所有类型名
pub fn type_names(class: &ClassInfo) -> Vec<String> {
    let mut names = Vec::new();
    any_in_hierarchy(class, |candidate| {
        names.push(candidate.name().to_string());
        false
    });
    names
}

/// `class` 是否为 `type_name` 本身或其子类型
pub fn is_subtype_of(class: &ClassInfo, type_name: &str) -> bool {
    any_in_hierarchy(class, |candidate| candidate.name() == type_name)
}
