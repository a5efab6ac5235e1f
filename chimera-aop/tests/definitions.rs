//! 编译期注册的切点

use chimera_aop::prelude::*;
use chimera_aop::get_all_pointcut_registrations;

register_pointcut!("registered", "services", Execution, "* com.example..*Service.*(..)");
register_pointcut!("registered", "untraced", Attribute, "Untraced");
// 引用在后面注册的切点也可以加载
register_pointcut!("registered", "traced", "services AND NOT untraced AND NOT internal");
register_pointcut!("registered", "internal", Class, "com.example.internal..*");

#[test]
fn registrations_are_collected() {
    let names: Vec<&str> = get_all_pointcut_registrations()
        .filter(|registration| registration.namespace == "registered")
        .map(|registration| registration.name)
        .collect();
    assert_eq!(names.len(), 4);
    assert!(names.contains(&"traced"));
}

#[test]
fn auto_load_into_explicit_registry() {
    let registry = NamespaceRegistry::new();
    assert_eq!(registry.auto_load_pointcuts().unwrap(), 4);

    let traced = registry.expression("registered", "traced").unwrap();
    assert_eq!(traced.pointcut_type(), PointcutType::Execution);

    let service = ClassInfo::new("com.example.order.OrderService");
    let place = MemberInfo::method("com.example.order.OrderService", "place");
    assert!(traced.matches(&service, &place));
    assert!(!traced.matches(&service, &place.clone().with_attribute("Untraced")));

    let internal = ClassInfo::new("com.example.internal.AuditService");
    let audit = MemberInfo::method("com.example.internal.AuditService", "audit");
    assert!(!traced.matches(&internal, &audit));
}

#[test]
fn global_registry_is_preloaded() {
    let first = global_registry();
    let second = global_registry();
    assert!(std::ptr::eq(first, second));
    assert!(first.expression("registered", "services").is_some());
}
