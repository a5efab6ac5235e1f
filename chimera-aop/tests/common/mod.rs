//! 集成测试共享的元数据夹具

#![allow(dead_code)]

use chimera_aop::{ClassInfo, ExpressionNamespace, MemberInfo, Modifiers, PointcutType};
use std::sync::Arc;

/// `com.foo.Bar`，带一个 `public void doIt()` 方法
pub fn bar() -> Arc<ClassInfo> {
    Arc::new(
        ClassInfo::new("com.foo.Bar")
            .with_method(do_it("com.foo.Bar"))
            .with_field(MemberInfo::field("com.foo.Bar", "count", "int").with_modifiers(Modifiers::PRIVATE)),
    )
}

/// `com.foo.SubBar extends com.foo.Bar implements com.foo.Auditable`
pub fn sub_bar() -> Arc<ClassInfo> {
    Arc::new(
        ClassInfo::new("com.foo.SubBar")
            .with_superclass(bar())
            .with_interface(auditable())
            .with_method(do_it("com.foo.SubBar")),
    )
}

/// `com.foo.LeafBar extends com.foo.SubBar`
pub fn leaf_bar() -> Arc<ClassInfo> {
    Arc::new(
        ClassInfo::new("com.foo.LeafBar")
            .with_superclass(sub_bar())
            .with_method(do_it("com.foo.LeafBar")),
    )
}

/// `com.foo.Auditable extends com.foo.Tracked`
pub fn auditable() -> Arc<ClassInfo> {
    Arc::new(ClassInfo::interface("com.foo.Auditable").with_interface(Arc::new(ClassInfo::interface("com.foo.Tracked"))))
}

pub fn baz() -> Arc<ClassInfo> {
    Arc::new(ClassInfo::new("com.foo.Baz").with_method(do_it("com.foo.Baz")))
}

/// `public void <declaring_type>.doIt()`
pub fn do_it(declaring_type: &str) -> MemberInfo {
    MemberInfo::method(declaring_type, "doIt")
        .with_modifiers(Modifiers::PUBLIC)
        .with_return_type("void")
}

/// 所有夹具类及其方法
pub fn fixtures() -> Vec<(Arc<ClassInfo>, MemberInfo)> {
    let mut fixtures = Vec::new();
    for class in [bar(), sub_bar(), leaf_bar(), baz()] {
        let methods: Vec<MemberInfo> = class.methods().to_vec();
        for method in methods {
            fixtures.push((class.clone(), method));
        }
    }

    let service = Arc::new(ClassInfo::new("com.foo.service.OrderService"));
    fixtures.push((
        service.clone(),
        MemberInfo::method("com.foo.service.OrderService", "getOrder")
            .with_modifiers(Modifiers::PUBLIC)
            .with_parameters(["long"])
            .with_return_type("com.foo.Order"),
    ));
    fixtures.push((
        service.clone(),
        MemberInfo::method("com.foo.service.OrderService", "place")
            .with_modifiers(Modifiers::PUBLIC)
            .with_parameters(["com.foo.Order", "java.lang.String"])
            .with_attribute("Transactional"),
    ));
    fixtures.push((
        service,
        MemberInfo::method("com.foo.service.OrderService", "reset")
            .with_modifiers(Modifiers::PRIVATE | Modifiers::STATIC),
    ));
    fixtures
}

/// 一组同为 EXECUTION 类型（或中性类型）的命名叶子
pub fn execution_namespace() -> ExpressionNamespace {
    let namespace = ExpressionNamespace::new("fixtures");
    let leaves = [
        ("publicMethods", "public * *..*.*(..)", PointcutType::Execution),
        ("barMethods", "* com.foo.Bar.*(..)", PointcutType::Execution),
        ("barTree", "* com.foo.Bar+.*(..)", PointcutType::Execution),
        ("getters", "* com..*.get*(..)", PointcutType::Execution),
        ("stringArgs", "* *..*.*(.., String)", PointcutType::Execution),
        ("voidMethods", "void *..*.*(..)", PointcutType::Execution),
        ("staticMethods", "static * *..*.*(..)", PointcutType::Execution),
    ];
    for (name, pattern, pointcut_type) in leaves {
        namespace
            .define(pattern, None, name, Some(pointcut_type))
            .expect("fixture pattern compiles");
    }
    namespace
        .define("Transactional", None, "transactional", Some(PointcutType::Attribute))
        .expect("fixture attribute compiles");
    namespace
}

/// `execution_namespace` 中的叶子名称
pub const LEAF_NAMES: [&str; 8] = [
    "publicMethods",
    "barMethods",
    "barTree",
    "getters",
    "stringArgs",
    "voidMethods",
    "staticMethods",
    "transactional",
];
