//! edupay HTTP Server
//!
//! Axum-based server exposing the checkout and payment-verification flow:
//! catalog resolution, order creation, callback verification and post-payment
//! routing.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edupay_core::{
    CatalogResolver, DEFAULT_TAX_RATE_PERCENT, MemoryCourseStore, MemorySessionStore,
};
use edupay_payments::{
    GatewayConfig, MemoryEntitlementStore, MockGateway, OrderGateway, OrderInitiator,
    PaymentVerifier, RazorpayGateway,
};

use crate::handlers::{
    create_order, dashboard_route, health_check, list_plans, my_entitlements, payment_failed,
    resolve_item, verify_payment,
};
use crate::state::{AppState, Payments};

/// Secret used for the mock gateway in demo mode
const DEMO_KEY_SECRET: &str = "edupay_demo_secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let demo_mode = std::env::var("EDUPAY_DEMO").is_ok_and(|v| v == "1");

    let tax_rate_percent = std::env::var("TAX_RATE_PERCENT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TAX_RATE_PERCENT);
    let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "INR".into());
    let merchant_name = std::env::var("MERCHANT_NAME").unwrap_or_else(|_| "EduPay".into());

    // Stores
    let courses = if demo_mode {
        Arc::new(MemoryCourseStore::with_demo_courses())
    } else {
        Arc::new(MemoryCourseStore::new())
    };
    let catalog = Arc::new(CatalogResolver::new(courses));
    let entitlements = Arc::new(MemoryEntitlementStore::new());

    let sessions = if demo_mode {
        let (store, token) = MemorySessionStore::with_demo_user();
        tracing::info!("Demo session token: {}", token);
        Arc::new(store)
    } else {
        Arc::new(MemorySessionStore::new())
    };

    // Payment wiring: real gateway when configured, mock in demo mode
    let payments = match GatewayConfig::from_env() {
        Ok(config) => {
            let key_secret = config.key_secret.clone();
            let gateway: Arc<dyn OrderGateway> = Arc::new(RazorpayGateway::new(config));
            tracing::info!("✓ {} gateway configured", gateway.name());
            Some(Arc::new(Payments {
                initiator: OrderInitiator::new(
                    gateway,
                    merchant_name.clone(),
                    currency.clone(),
                    tax_rate_percent,
                ),
                verifier: PaymentVerifier::new(key_secret, entitlements.clone()),
            }))
        }
        Err(_) if demo_mode => {
            let gateway: Arc<dyn OrderGateway> = Arc::new(MockGateway::new());
            tracing::warn!("⚠ Demo mode: using mock gateway");
            Some(Arc::new(Payments {
                initiator: OrderInitiator::new(
                    gateway,
                    merchant_name.clone(),
                    currency.clone(),
                    tax_rate_percent,
                ),
                verifier: PaymentVerifier::new(DEMO_KEY_SECRET, entitlements.clone()),
            }))
        }
        Err(e) => {
            tracing::warn!("⚠ Gateway not configured - payments disabled: {}", e);
            tracing::warn!("  Set RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET in .env");
            None
        }
    };

    tracing::info!(
        tax_rate_percent,
        %currency,
        %merchant_name,
        "Checkout configuration loaded"
    );

    // Build application state
    let app_state = AppState {
        catalog,
        sessions,
        entitlements,
        payments,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & catalog
        .route("/health", get(health_check))
        .route("/api/catalog/plans", get(list_plans))
        .route("/api/catalog/{kind}/{id}", get(resolve_item))
        // Checkout flow
        .route("/api/checkout/order", post(create_order))
        .route("/api/payment/verify", post(verify_payment))
        .route("/api/payment/failed", post(payment_failed))
        // Post-payment routing & entitlements
        .route("/api/dashboard-route", get(dashboard_route))
        .route("/api/me/entitlements", get(my_entitlements))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 edupay server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  GET  /api/catalog/plans         - List plans");
    tracing::info!("  GET  /api/catalog/{{kind}}/{{id}}   - Resolve an item");
    tracing::info!("  POST /api/checkout/order        - Create a gateway order");
    tracing::info!("  POST /api/payment/verify        - Verify a payment callback");
    tracing::info!("  POST /api/payment/failed        - Report a widget failure");
    tracing::info!("  GET  /api/dashboard-route       - Post-payment dashboard path");
    tracing::info!("  GET  /api/me/entitlements       - Current user's entitlements");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
