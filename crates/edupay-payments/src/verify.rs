//! Payment Verification
//!
//! Validates the gateway's callback payload against the server-only secret and
//! grants the entitlement in the same step. The signature is HMAC-SHA256 over
//! `"{order_id}|{payment_id}"`, hex-encoded, compared in constant time.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

use edupay_core::ItemKind;

use crate::entitlement::{EntitlementGrant, EntitlementStore, GrantOutcome};
use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Gateway callback payload plus the checkout context it belongs to.
/// Ephemeral; consumed exactly once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub user_id: String,
    pub item_id: String,
    pub item_type: ItemKind,
    /// Total in integer minor units, as carried in the order notes
    pub amount_minor: i64,
}

/// Outcome reported to the client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Verifies payment signatures and grants entitlements
pub struct PaymentVerifier<S: EntitlementStore> {
    key_secret: String,
    store: Arc<S>,
    plan_validity: chrono::Duration,
}

impl<S: EntitlementStore> PaymentVerifier<S> {
    pub fn new(key_secret: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            key_secret: key_secret.into(),
            store,
            plan_validity: chrono::Duration::days(365),
        }
    }

    /// Override the plan validity period (defaults to 365 days)
    pub fn with_plan_validity(mut self, validity: chrono::Duration) -> Self {
        self.plan_validity = validity;
        self
    }

    /// Verify a callback and grant the entitlement.
    ///
    /// `SignatureInvalid` means the payload failed the trust check and must
    /// never be retried. `GrantPersistence` means the signature was valid but
    /// the durable write failed; the caller must not treat the user as
    /// entitled.
    pub fn verify(&self, request: &VerificationRequest) -> Result<GrantOutcome> {
        self.check_signature(request)?;

        let granted_at = chrono::Utc::now();
        let expires_at = match request.item_type {
            ItemKind::Plan => Some(granted_at + self.plan_validity),
            ItemKind::Course => None,
        };

        let grant = EntitlementGrant {
            payment_id: request.gateway_payment_id.clone(),
            order_id: request.gateway_order_id.clone(),
            user_id: request.user_id.clone(),
            item_id: request.item_id.clone(),
            kind: request.item_type,
            amount_minor: request.amount_minor,
            granted_at,
            expires_at,
        };

        let outcome = self
            .store
            .grant(&grant)
            .map_err(|e| PaymentError::GrantPersistence(e.to_string()))?;

        match outcome {
            GrantOutcome::Created => tracing::info!(
                payment_id = %grant.payment_id,
                user_id = %grant.user_id,
                item_id = %grant.item_id,
                kind = %grant.kind,
                "Granted entitlement"
            ),
            GrantOutcome::AlreadyGranted => tracing::info!(
                payment_id = %grant.payment_id,
                "Duplicate verification; entitlement already granted"
            ),
        }

        Ok(outcome)
    }

    /// Verify and collapse the result into the client-facing shape
    pub fn verify_and_report(&self, request: &VerificationRequest) -> VerificationResult {
        match self.verify(request) {
            Ok(_) => VerificationResult::ok(),
            Err(err) => {
                // Trust violations and infra faults are logged apart but
                // presented identically to the user.
                match &err {
                    PaymentError::SignatureInvalid => tracing::warn!(
                        order_id = %request.gateway_order_id,
                        payment_id = %request.gateway_payment_id,
                        "Payment signature rejected"
                    ),
                    _ => tracing::error!(
                        order_id = %request.gateway_order_id,
                        error = %err,
                        "Verification failed after gateway callback"
                    ),
                }
                VerificationResult::failed(err.user_message())
            }
        }
    }

    fn check_signature(&self, request: &VerificationRequest) -> Result<()> {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|_| PaymentError::Config("invalid gateway secret".into()))?;
        mac.update(request.gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(request.gateway_payment_id.as_bytes());

        let provided =
            hex::decode(&request.gateway_signature).map_err(|_| PaymentError::SignatureInvalid)?;

        // Constant-time comparison
        mac.verify_slice(&provided)
            .map_err(|_| PaymentError::SignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::MemoryEntitlementStore;

    const SECRET: &str = "test_key_secret_123";

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn course_request(payment_id: &str, signature: String) -> VerificationRequest {
        VerificationRequest {
            gateway_order_id: "order_9".into(),
            gateway_payment_id: payment_id.into(),
            gateway_signature: signature,
            user_id: "u1".into(),
            item_id: "abc123".into(),
            item_type: ItemKind::Course,
            amount_minor: 176_882,
        }
    }

    fn verifier() -> (Arc<MemoryEntitlementStore>, PaymentVerifier<MemoryEntitlementStore>) {
        let store = Arc::new(MemoryEntitlementStore::new());
        (store.clone(), PaymentVerifier::new(SECRET, store))
    }

    #[test]
    fn test_valid_signature_grants_course_enrollment() {
        let (store, verifier) = verifier();
        let request = course_request("pay_ok", sign(SECRET, "order_9", "pay_ok"));

        let result = verifier.verify_and_report(&request);
        assert!(result.success);
        assert_eq!(store.enrolled_courses("u1").unwrap(), vec!["abc123".to_string()]);
    }

    #[test]
    fn test_tampered_signature_never_grants() {
        let (store, verifier) = verifier();
        // Signed with the wrong secret
        let request = course_request("pay_bad", sign("wrong_secret", "order_9", "pay_bad"));

        let result = verifier.verify_and_report(&request);
        assert!(!result.success);
        assert!(result.message.is_some());
        assert!(store.enrolled_courses("u1").unwrap().is_empty());
        assert!(store.active_plan("u1").unwrap().is_none());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let (store, verifier) = verifier();
        let request = course_request("pay_junk", "not-even-hex!".into());
        assert!(matches!(
            verifier.verify(&request),
            Err(PaymentError::SignatureInvalid)
        ));
        assert!(store.enrolled_courses("u1").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_payment_id_grants_exactly_once() {
        let (store, verifier) = verifier();
        let request = course_request("pay_dup", sign(SECRET, "order_9", "pay_dup"));

        assert_eq!(verifier.verify(&request).unwrap(), GrantOutcome::Created);
        assert_eq!(verifier.verify(&request).unwrap(), GrantOutcome::AlreadyGranted);

        // Repeat is a no-op success for the client
        assert!(verifier.verify_and_report(&request).success);
        assert_eq!(store.enrolled_courses("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_plan_grant_carries_expiry() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let verifier = PaymentVerifier::new(SECRET, store.clone())
            .with_plan_validity(chrono::Duration::days(30));

        let request = VerificationRequest {
            gateway_order_id: "order_p".into(),
            gateway_payment_id: "pay_plan".into(),
            gateway_signature: sign(SECRET, "order_p", "pay_plan"),
            user_id: "u2".into(),
            item_id: "standard".into(),
            item_type: ItemKind::Plan,
            amount_minor: 1_179_882,
        };
        verifier.verify(&request).unwrap();

        let active = store.active_plan("u2").unwrap().unwrap();
        assert_eq!(active.plan_id, "standard");
        let validity = active.expires_at.unwrap() - active.activated_at;
        assert_eq!(validity.num_days(), 30);
    }

    #[test]
    fn test_store_failure_after_valid_signature_reports_failure() {
        struct FailingStore;
        impl EntitlementStore for FailingStore {
            fn grant(&self, _: &EntitlementGrant) -> Result<GrantOutcome> {
                Err(PaymentError::Storage("disk full".into()))
            }
            fn enrolled_courses(&self, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
            fn active_plan(&self, _: &str) -> Result<Option<crate::entitlement::PlanActivation>> {
                Ok(None)
            }
        }

        let verifier = PaymentVerifier::new(SECRET, Arc::new(FailingStore));
        let request = course_request("pay_io", sign(SECRET, "order_9", "pay_io"));

        assert!(matches!(
            verifier.verify(&request),
            Err(PaymentError::GrantPersistence(_))
        ));

        let report = verifier.verify_and_report(&request);
        assert!(!report.success, "client must not see success without a durable grant");
    }
}
