//! 匹配结果缓存
//!
//! 匹配结果只取决于表达式与上下文，多个线程同时计算同一个键时最后写入的结果生效。
//! 表达式按构建编号参与键，重新定义的同名表达式不会命中旧结果。
//! 类只按名称参与键，缓存假设类元数据在缓存生命周期内不变。

use crate::expression::Expression;
use crate::joinpoint::ExpressionContext;
use crate::metadata::MemberInfo;
use crate::pointcut::PointcutType;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 默认最大条目数
pub const DEFAULT_MAX_ENTRIES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContextKey {
    expression: u64,
    pointcut_type: PointcutType,
    class: String,
    member: Option<MemberInfo>,
    exception_type: Option<String>,
}

impl ContextKey {
    fn new(expression: &Expression, ctx: &ExpressionContext<'_>) -> Self {
        Self {
            expression: expression.id(),
            pointcut_type: ctx.pointcut_type(),
            class: ctx.class().name().to_string(),
            member: ctx.member().cloned(),
            exception_type: ctx.exception_type().map(str::to_string),
        }
    }
}

/// 匹配结果缓存
///
/// 达到 `max_entries` 后不再插入新条目，已有条目继续命中
#[derive(Debug)]
pub struct MatchCache {
    entries: DashMap<ContextKey, bool>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    saturated: AtomicBool,
}

impl MatchCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            saturated: AtomicBool::new(false),
        }
    }

    /// 带缓存的 [`Expression::matches_context`]
    pub fn matches(&self, expression: &Expression, ctx: &ExpressionContext<'_>) -> bool {
        let key = ContextKey::new(expression, ctx);
        if let Some(cached) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Match cache hit for '{}' at {}", expression.name(), ctx);
            return *cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let matched = expression.matches_context(ctx);

        if self.entries.len() < self.max_entries {
            self.entries.insert(key, matched);
        } else if !self.saturated.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "Match cache is full ({} entries); new results will not be cached",
                self.max_entries
            );
        }
        matched
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// 清空条目，计数器保留
    ///
    /// 键里只有类名：以同一个名称重新加载类时（父类、接口、修饰符或注解变化），
    /// `+` 层次模式、类修饰符模式和注解匹配的旧结果会继续命中，必须先调用此方法。
    pub fn clear(&self) {
        self.entries.clear();
        self.saturated.store(false, Ordering::Relaxed);
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
