//! Application State

use std::sync::Arc;

use edupay_core::{CatalogResolver, MemoryCourseStore, MemorySessionStore};
use edupay_payments::{MemoryEntitlementStore, OrderGateway, OrderInitiator, PaymentVerifier};

/// Payment wiring; absent when the gateway is not configured
pub struct Payments {
    /// Creates gateway orders and widget configs
    pub initiator: OrderInitiator<dyn OrderGateway>,

    /// Verifies callbacks and grants entitlements
    pub verifier: PaymentVerifier<MemoryEntitlementStore>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Plan catalog plus course store
    pub catalog: Arc<CatalogResolver<MemoryCourseStore>>,

    /// Auth boundary: bearer token to user
    pub sessions: Arc<MemorySessionStore>,

    /// Durable entitlements (enrollments, plan activations)
    pub entitlements: Arc<MemoryEntitlementStore>,

    /// Payment flow (None if the gateway is not configured)
    pub payments: Option<Arc<Payments>>,
}
