//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Checkout and payment-flow errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Catalog resolution failed (item missing or malformed)
    #[error("Catalog error: {0}")]
    Catalog(#[from] edupay_core::CoreError),

    /// No session; carries the login redirect that resumes checkout
    #[error("Not authenticated")]
    Unauthenticated { redirect: String },

    /// User has not accepted the terms gate
    #[error("Terms not accepted")]
    TermsNotAccepted,

    /// Gateway refused the order or returned no order id
    #[error("Order creation failed: {0}")]
    OrderCreation(String),

    /// Gateway API/transport error
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Signature did not validate; trust boundary violation, never retried
    #[error("Payment signature invalid")]
    SignatureInvalid,

    /// Durable write failed after a valid signature; infrastructure fault
    #[error("Entitlement grant failed: {0}")]
    GrantPersistence(String),

    /// User closed the widget or the widget reported failure; terminal
    #[error("Payment cancelled: {0}")]
    UserCancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::OrderCreation(_)
                | PaymentError::Gateway(_)
                | PaymentError::GrantPersistence(_)
                | PaymentError::Storage(_)
        )
    }

    /// Get user-friendly message
    ///
    /// `SignatureInvalid` and `GrantPersistence` deliberately share one generic
    /// message; they are distinguished internally, not to the user.
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Catalog(edupay_core::CoreError::ItemNotFound { .. }) => {
                "This item is no longer available.".into()
            }
            PaymentError::Unauthenticated { .. } => "Please sign in to continue.".into(),
            PaymentError::TermsNotAccepted => {
                "Please accept the terms and conditions to continue.".into()
            }
            PaymentError::OrderCreation(_) | PaymentError::Gateway(_) => {
                "Could not start the payment. Please try again.".into()
            }
            PaymentError::SignatureInvalid | PaymentError::GrantPersistence(_) => {
                "Payment verification failed. If you were charged, please contact support.".into()
            }
            PaymentError::UserCancelled(_) => "Payment was cancelled.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_and_infra_failures_share_user_message() {
        let sig = PaymentError::SignatureInvalid;
        let infra = PaymentError::GrantPersistence("db down".into());
        assert_eq!(sig.user_message(), infra.user_message());
        assert!(!sig.is_retryable());
        assert!(infra.is_retryable());
    }
}
