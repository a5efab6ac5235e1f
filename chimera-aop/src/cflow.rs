//! 控制流（cflow）栈
//!
//! 记录当前执行上下文中已经进入的连接点。帧是集合而不是多重集合：
//! 重复进入同一个帧不会叠加，退出不存在的帧只记录警告。
//!
//! [`CflowStack`] 不是 `Sync`，每个执行上下文持有自己的实例；
//! [`CflowStack::with_current`] 提供按线程隔离的实例。

use crate::expression::Expression;
use crate::joinpoint::ExpressionContext;
use crate::metadata::{ClassInfo, MemberInfo};
use crate::pointcut::PointcutType;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

thread_local! {
    static CURRENT: CflowStack = CflowStack::new();
}

/// 控制流帧
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CflowFrame {
    pointcut_type: PointcutType,
    member: MemberInfo,
    class: Arc<ClassInfo>,
}

impl CflowFrame {
    pub fn new(pointcut_type: PointcutType, member: MemberInfo, class: Arc<ClassInfo>) -> Self {
        Self {
            pointcut_type,
            member,
            class,
        }
    }

    pub fn pointcut_type(&self) -> PointcutType {
        self.pointcut_type
    }

    pub fn member(&self) -> &MemberInfo {
        &self.member
    }

    pub fn class(&self) -> &ClassInfo {
        &self.class
    }

    fn context(&self) -> ExpressionContext<'_> {
        ExpressionContext::with_member(self.pointcut_type, &self.class, &self.member)
    }
}

/// 控制流栈
#[derive(Debug, Default)]
pub struct CflowStack {
    frames: RefCell<HashSet<CflowFrame>>,
}

impl CflowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在当前线程的栈上执行
    pub fn with_current<R>(f: impl FnOnce(&CflowStack) -> R) -> R {
        CURRENT.with(f)
    }

    /// 进入连接点，返回帧是否是新加入的
    pub fn enter(&self, pointcut_type: PointcutType, member: MemberInfo, class: Arc<ClassInfo>) -> bool {
        self.insert(CflowFrame::new(pointcut_type, member, class))
    }

    /// 退出连接点；帧不存在时忽略
    pub fn exit(&self, pointcut_type: PointcutType, member: &MemberInfo, class: &Arc<ClassInfo>) {
        let frame = CflowFrame::new(pointcut_type, member.clone(), class.clone());
        self.remove(&frame);
    }

    /// 进入连接点并返回守卫，守卫析构时退出
    ///
    /// 只有真正加入了帧的守卫才会在析构时移除它，嵌套进入同一帧时外层的帧保持不变
    pub fn enter_scoped(&self, pointcut_type: PointcutType, member: MemberInfo, class: Arc<ClassInfo>) -> CflowGuard<'_> {
        let frame = CflowFrame::new(pointcut_type, member, class);
        let owned = if self.insert(frame.clone()) {
            Some(frame)
        } else {
            None
        };
        CflowGuard { stack: self, frame: owned }
    }

    /// 是否处于表达式 cflow 部分所描述的控制流中
    pub fn is_in_control_flow_of(&self, expression: &Expression) -> bool {
        if !expression.has_cflow() {
            return false;
        }
        self.frames
            .borrow()
            .iter()
            .any(|frame| expression.match_cflow(&frame.context()))
    }

    pub fn contains(&self, frame: &CflowFrame) -> bool {
        self.frames.borrow().contains(frame)
    }

    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.frames.borrow_mut().clear();
    }

    fn insert(&self, frame: CflowFrame) -> bool {
        tracing::trace!("Entering cflow frame {} {}", frame.pointcut_type, frame.member);
        self.frames.borrow_mut().insert(frame)
    }

    fn remove(&self, frame: &CflowFrame) {
        if !self.frames.borrow_mut().remove(frame) {
            tracing::warn!(
                "Unbalanced cflow exit ignored: {} {} was not entered",
                frame.pointcut_type,
                frame.member
            );
        }
    }
}

/// [`CflowStack::enter_scoped`] 返回的守卫
#[must_use = "the frame is removed as soon as the guard is dropped"]
pub struct CflowGuard<'a> {
    stack: &'a CflowStack,
    frame: Option<CflowFrame>,
}

impl CflowGuard<'_> {
    /// 守卫是否持有（并将移除）帧
    pub fn owns_frame(&self) -> bool {
        self.frame.is_some()
    }
}

impl Drop for CflowGuard<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.stack.remove(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> (Arc<ClassInfo>, MemberInfo) {
        (Arc::new(ClassInfo::new("com.foo.Job")), MemberInfo::method("com.foo.Job", "run"))
    }

    fn in_job() -> Expression {
        Expression::leaf("inJob", "test", "com.foo.Job#run(..)", None, PointcutType::Cflow).unwrap()
    }

    #[test]
    fn test_enter_exit() {
        let stack = CflowStack::new();
        let (class, run) = job();
        let expression = in_job();

        assert!(!stack.is_in_control_flow_of(&expression));
        assert!(stack.enter(PointcutType::Cflow, run.clone(), class.clone()));
        assert!(stack.is_in_control_flow_of(&expression));

        // 集合语义
        assert!(!stack.enter(PointcutType::Cflow, run.clone(), class.clone()));
        assert_eq!(stack.len(), 1);

        stack.exit(PointcutType::Cflow, &run, &class);
        assert!(!stack.is_in_control_flow_of(&expression));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_unbalanced_exit_is_ignored() {
        let stack = CflowStack::new();
        let (class, run) = job();
        stack.exit(PointcutType::Cflow, &run, &class);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_expression_without_cflow() {
        let stack = CflowStack::new();
        let (class, run) = job();
        stack.enter(PointcutType::Cflow, run, class);

        let expression = Expression::leaf("exec", "test", "* com.foo.Job.run(..)", None, PointcutType::Execution).unwrap();
        assert!(!stack.is_in_control_flow_of(&expression));
    }

    #[test]
    fn test_scoped_guard() {
        let stack = CflowStack::new();
        let (class, run) = job();
        let expression = in_job();

        {
            let outer = stack.enter_scoped(PointcutType::Cflow, run.clone(), class.clone());
            assert!(outer.owns_frame());
            {
                let inner = stack.enter_scoped(PointcutType::Cflow, run.clone(), class.clone());
                assert!(!inner.owns_frame());
            }
            // 内层守卫不会移除外层的帧
            assert!(stack.is_in_control_flow_of(&expression));
        }
        assert!(!stack.is_in_control_flow_of(&expression));
    }

    #[test]
    fn test_thread_isolation() {
        let (class, run) = job();
        let expression = Arc::new(in_job());

        CflowStack::with_current(|stack| {
            stack.enter(PointcutType::Cflow, run.clone(), class.clone());
        });

        let other = expression.clone();
        let seen_elsewhere = std::thread::spawn(move || {
            CflowStack::with_current(|stack| stack.is_in_control_flow_of(&other))
        })
        .join()
        .unwrap();
        assert!(!seen_elsewhere);

        assert!(CflowStack::with_current(|stack| stack.is_in_control_flow_of(&expression)));
        CflowStack::with_current(|stack| stack.clear());
    }
}
