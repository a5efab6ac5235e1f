use anyhow::{Context, Result};
use chimera_aop::prelude::*;
use std::sync::Arc;

const CONFIG: &str = include_str!("pointcuts.toml");

fn main() -> Result<()> {
    let config = EngineConfig::from_toml_str(CONFIG)
        .context("failed to parse embedded pointcut configuration")?
        .with_env_overrides()
        .context("invalid environment override")?;

    config.logging.clone().init().context("failed to initialize logging")?;

    let registry = config.build_registry().context("failed to load pointcut definitions")?;
    let cache = config.build_cache();
    let shop = registry.default_namespace();

    tracing::info!("Namespaces: {:?}", registry.keys());
    tracing::info!("Pointcuts in '{}': {:?}", shop.name(), shop.names());

    // ==================== 元数据 ====================

    let order_service = Arc::new(
        ClassInfo::new("com.example.shop.OrderService")
            .with_method(
                MemberInfo::method("com.example.shop.OrderService", "placeOrder")
                    .with_modifiers(Modifiers::PUBLIC)
                    .with_parameters(["com.example.shop.Cart"]),
            )
            .with_method(
                MemberInfo::method("com.example.shop.OrderService", "getOrder")
                    .with_modifiers(Modifiers::PUBLIC)
                    .with_parameters(["long"]),
            )
            .with_method(
                MemberInfo::method("com.example.shop.OrderService", "ping")
                    .with_modifiers(Modifiers::PUBLIC)
                    .with_attribute("NoAudit"),
            ),
    );

    let gateway = Arc::new(ClassInfo::interface("com.example.shop.PaymentGateway"));
    let stripe = Arc::new(
        ClassInfo::new("com.example.shop.StripeGateway")
            .with_interface(gateway)
            .with_method(
                MemberInfo::method("com.example.shop.StripeGateway", "charge")
                    .with_modifiers(Modifiers::PUBLIC)
                    .with_parameters(["java.math.BigDecimal"]),
            ),
    );

    let controller = Arc::new(ClassInfo::new("com.example.shop.CheckoutController"));
    let checkout = MemberInfo::method("com.example.shop.CheckoutController", "checkout");

    // ==================== 结构匹配 ====================

    let audited = shop
        .get("auditedServices")
        .context("auditedServices is not defined")?;

    for method in order_service.methods() {
        let ctx = ExpressionContext::with_member(PointcutType::Execution, &order_service, method);
        let matched = match &cache {
            Some(cache) => cache.matches(&audited, &ctx),
            None => audited.matches_context(&ctx),
        };
        tracing::info!("{} -> audited: {}", ctx, matched);
    }

    // ==================== 控制流 ====================

    let payments = shop
        .get("paymentsDuringCheckout")
        .context("paymentsDuringCheckout is not defined")?;
    let charge = stripe
        .find_method("charge")
        .context("StripeGateway has no charge method")?;
    let ctx = ExpressionContext::with_member(PointcutType::Execution, &stripe, charge);

    CflowStack::with_current(|stack| {
        tracing::info!("{} outside checkout -> {}", ctx, payments.matches_with_cflow(&ctx, stack));

        let _guard = stack.enter_scoped(PointcutType::Cflow, checkout.clone(), controller.clone());
        tracing::info!("{} inside checkout -> {}", ctx, payments.matches_with_cflow(&ctx, stack));
    });

    // ==================== 异常处理器 ====================

    let io_handlers = registry
        .expression("errors", "ioHandlers")
        .context("errors::ioHandlers is not defined")?;
    let io = Arc::new(ClassInfo::new("java.io.IOException"));
    let not_found = ClassInfo::new("java.io.FileNotFoundException").with_superclass(io);
    tracing::info!("handler {} -> {}", not_found, io_handlers.matches_class(&not_found));

    if let Some(cache) = &cache {
        tracing::info!(
            "Match cache: {} entries, {} hits, {} misses",
            cache.len(),
            cache.hits(),
            cache.misses()
        );
    }

    Ok(())
}
