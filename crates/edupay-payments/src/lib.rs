//! # edupay-payments
//!
//! Payment order creation, signature verification and entitlement grants.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   create order    ┌──────────┐   widget handoff   ┌──────────┐
//! │ Resolver │──────────────────▶│ Gateway  │───────────────────▶│  User    │
//! │ (core)   │                   │ order API│                    │  pays    │
//! └──────────┘                   └──────────┘                    └────┬─────┘
//!                                                                    │ callback
//!                                                               ┌────▼─────┐
//!                                                               │ Verifier │
//!                                                               │ HMAC +   │
//!                                                               │ grant    │
//!                                                               └──────────┘
//! ```
//!
//! The widget step is fully delegated to the gateway's client library; this
//! crate owns everything server-side. Verification recomputes the gateway
//! signature (HMAC-SHA256 over `order_id|payment_id`) with the server-only
//! secret and grants the entitlement idempotently, keyed on the payment id.
//!
//! If the user closes the widget no callback ever fires and the order is
//! orphaned at the gateway; reconciling those requires a webhook listener that
//! does not exist yet.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edupay_payments::{OrderInitiator, PaymentVerifier, RazorpayGateway};
//!
//! let gateway = Arc::new(RazorpayGateway::from_env()?);
//! let initiator = OrderInitiator::new(gateway, "EduPay", "INR", 18);
//!
//! let order = initiator.create_order(&item, &user, true).await?;
//! // Hand initiator.widget_config(&order, &item, &user) to the client.
//!
//! // Later, on the gateway callback:
//! let result = verifier.verify_and_report(&request);
//! ```

mod entitlement;
mod error;
mod gateway;
mod order;
mod verify;

pub use entitlement::{
    EntitlementGrant, EntitlementStore, GrantOutcome, MemoryEntitlementStore, PlanActivation,
};
pub use error::{PaymentError, Result};
pub use gateway::{
    GatewayConfig, GatewayOrder, MockGateway, OrderGateway, OrderNotes, OrderRequest,
    RazorpayGateway,
};
pub use order::{CheckoutOrder, OrderInitiator, WidgetConfig, WidgetPrefill, WidgetTheme};
pub use verify::{PaymentVerifier, VerificationRequest, VerificationResult};
