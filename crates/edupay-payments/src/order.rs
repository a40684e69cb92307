//! Order Initiation
//!
//! Computes the payable total in integer minor units, builds a receipt
//! reference, and requests an order handle from the gateway. Also builds the
//! configuration handed to the client-side payment widget; everything after
//! that handoff belongs to the gateway until its callback arrives.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use edupay_core::{MinorUnits, PurchasableItem, User};

use crate::error::{PaymentError, Result};
use crate::gateway::{OrderGateway, OrderNotes, OrderRequest};

/// A created checkout order; write-once, never revisited.
///
/// If the user abandons the widget the order stays orphaned at the gateway —
/// there is no reconciliation path yet.
// TODO: add a gateway webhook listener so captured-but-unverified payments
// can be reconciled when the browser never calls back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutOrder {
    pub gateway_order_id: String,
    /// Total in integer minor units, tax included
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Configuration for the client-side payment widget (handoff boundary).
///
/// Field names follow the widget's expected shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: WidgetPrefill,
    pub notes: OrderNotes,
    pub theme: WidgetTheme,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetPrefill {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetTheme {
    pub color: String,
}

/// Creates gateway orders for resolved items
pub struct OrderInitiator<G: OrderGateway + ?Sized> {
    gateway: Arc<G>,
    merchant_name: String,
    currency: String,
    tax_rate_percent: u32,
    receipt_seq: AtomicU64,
}

impl<G: OrderGateway + ?Sized> OrderInitiator<G> {
    pub fn new(
        gateway: Arc<G>,
        merchant_name: impl Into<String>,
        currency: impl Into<String>,
        tax_rate_percent: u32,
    ) -> Self {
        Self {
            gateway,
            merchant_name: merchant_name.into(),
            currency: currency.into(),
            tax_rate_percent,
            receipt_seq: AtomicU64::new(0),
        }
    }

    pub const fn tax_rate_percent(&self) -> u32 {
        self.tax_rate_percent
    }

    /// Build a receipt reference for this attempt.
    ///
    /// Timestamp plus sequence keeps it monotonic-ish for debugging; it is not
    /// an idempotency key.
    fn receipt_ref(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = self.receipt_seq.fetch_add(1, Ordering::SeqCst);
        format!("rcpt_{millis}_{seq}")
    }

    /// Create a gateway order for `item` on behalf of `user`.
    ///
    /// The caller must hold an authenticated session; terms must be accepted.
    /// On failure no widget should open.
    pub async fn create_order(
        &self,
        item: &PurchasableItem,
        user: &User,
        terms_accepted: bool,
    ) -> Result<CheckoutOrder> {
        if !terms_accepted {
            return Err(PaymentError::TermsNotAccepted);
        }

        let total = MinorUnits::from_price(item.price)
            .and_then(|m| m.with_tax(self.tax_rate_percent))
            .map_err(PaymentError::Catalog)?;

        let notes = OrderNotes {
            user_id: user.id.clone(),
            item_id: item.id.clone(),
            item_type: item.kind.as_str().into(),
            amount: total.to_string(),
        };

        let request = OrderRequest {
            amount: total.value(),
            currency: self.currency.clone(),
            receipt: self.receipt_ref(),
            notes: notes.clone(),
        };

        let order = self.gateway.create_order(&request).await?;

        tracing::info!(
            order_id = %order.id,
            item_id = %item.id,
            item_kind = %item.kind,
            amount_minor = order.amount,
            "Created gateway order"
        );

        Ok(CheckoutOrder {
            gateway_order_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            receipt: request.receipt,
            notes,
        })
    }

    /// Build the client widget configuration for a created order
    pub fn widget_config(
        &self,
        order: &CheckoutOrder,
        item: &PurchasableItem,
        user: &User,
    ) -> WidgetConfig {
        WidgetConfig {
            key: self.gateway.key_id().into(),
            amount: order.amount_minor,
            currency: order.currency.clone(),
            name: self.merchant_name.clone(),
            description: item.name.clone(),
            order_id: order.gateway_order_id.clone(),
            prefill: WidgetPrefill {
                name: user.name.clone(),
                email: user.email.clone(),
                contact: user.contact.clone(),
            },
            notes: order.notes.clone(),
            theme: WidgetTheme {
                color: "#2563eb".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use edupay_core::{ItemKind, Role};
    use rust_decimal_macros::dec;

    fn standard_plan() -> PurchasableItem {
        PurchasableItem {
            id: "standard".into(),
            kind: ItemKind::Plan,
            name: "Standard".into(),
            price: dec!(9999),
            features: vec![],
            validity_days: Some(365),
        }
    }

    fn student() -> User {
        User {
            id: "u1".into(),
            name: "Asha Verma".into(),
            email: "asha@example.com".into(),
            role: Role::Student,
            contact: None,
        }
    }

    fn initiator() -> (Arc<MockGateway>, OrderInitiator<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let initiator = OrderInitiator::new(gateway.clone(), "EduPay", "INR", 18);
        (gateway, initiator)
    }

    #[tokio::test]
    async fn test_order_total_is_price_plus_tax_in_minor_units() {
        let (gateway, initiator) = initiator();
        let order = initiator
            .create_order(&standard_plan(), &student(), true)
            .await
            .unwrap();

        // 9999.00 @ 18% GST = 1179882 paise
        assert_eq!(order.amount_minor, 1_179_882);
        assert_eq!(order.currency, "INR");

        let sent = gateway.orders();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 1_179_882);
        assert_eq!(sent[0].notes.user_id, "u1");
        assert_eq!(sent[0].notes.item_id, "standard");
        assert_eq!(sent[0].notes.item_type, "plan");
        assert_eq!(sent[0].notes.amount, "1179882");
    }

    #[tokio::test]
    async fn test_terms_gate_blocks_order_creation() {
        let (gateway, initiator) = initiator();
        let err = initiator
            .create_order(&standard_plan(), &student(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::TermsNotAccepted));
        assert!(gateway.orders().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_surfaces_as_error() {
        let (gateway, initiator) = initiator();
        gateway.fail_next();
        let err = initiator
            .create_order(&standard_plan(), &student(), true)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_receipts_are_unique_per_attempt() {
        let (_, initiator) = initiator();
        let a = initiator
            .create_order(&standard_plan(), &student(), true)
            .await
            .unwrap();
        let b = initiator
            .create_order(&standard_plan(), &student(), true)
            .await
            .unwrap();
        assert_ne!(a.receipt, b.receipt);
        assert!(a.receipt.starts_with("rcpt_"));
    }

    #[tokio::test]
    async fn test_widget_config_carries_order_handle_and_prefill() {
        let (_, initiator) = initiator();
        let item = standard_plan();
        let user = student();
        let order = initiator.create_order(&item, &user, true).await.unwrap();
        let widget = initiator.widget_config(&order, &item, &user);

        assert_eq!(widget.key, "rzp_test_mock");
        assert_eq!(widget.order_id, order.gateway_order_id);
        assert_eq!(widget.amount, order.amount_minor);
        assert_eq!(widget.prefill.email, "asha@example.com");
        assert_eq!(widget.description, "Standard");
    }
}
