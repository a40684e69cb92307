//! Entitlement Grants
//!
//! The durable side effect of a successful verification: a course enrollment
//! or an active-plan activation. Grants are only ever created by the verifier,
//! and are keyed on the gateway payment id so a duplicate callback can never
//! grant twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use edupay_core::ItemKind;

use crate::error::{PaymentError, Result};

/// A verified entitlement grant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntitlementGrant {
    /// Gateway payment id; the idempotency key for the grant
    pub payment_id: String,
    pub order_id: String,
    pub user_id: String,
    pub item_id: String,
    pub kind: ItemKind,
    pub amount_minor: i64,
    pub granted_at: DateTime<Utc>,
    /// Plan expiry; `None` for course enrollments
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of a grant attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantOutcome {
    /// First time this payment id was seen; entitlement applied
    Created,
    /// Payment id already granted; no-op
    AlreadyGranted,
}

/// An active plan on a user record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanActivation {
    pub plan_id: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Entitlement storage trait
///
/// `grant` must be atomic: either the payment id is recorded and the user
/// record mutated together, or neither happens.
pub trait EntitlementStore: Send + Sync {
    /// Apply a grant, conditional on the payment id being unseen
    fn grant(&self, grant: &EntitlementGrant) -> Result<GrantOutcome>;

    /// Course ids the user is enrolled in
    fn enrolled_courses(&self, user_id: &str) -> Result<Vec<String>>;

    /// The user's active plan, if any
    fn active_plan(&self, user_id: &str) -> Result<Option<PlanActivation>>;
}

#[derive(Default)]
struct UserEntitlements {
    enrolled_courses: Vec<String>,
    active_plan: Option<PlanActivation>,
}

#[derive(Default)]
struct Inner {
    seen_payments: HashSet<String>,
    users: HashMap<String, UserEntitlements>,
}

/// In-memory entitlement store (for development and tests)
pub struct MemoryEntitlementStore {
    // Single lock so the payment-id check and the user mutation are atomic
    inner: RwLock<Inner>,
}

impl Default for MemoryEntitlementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEntitlementStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl EntitlementStore for MemoryEntitlementStore {
    fn grant(&self, grant: &EntitlementGrant) -> Result<GrantOutcome> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| PaymentError::Storage("entitlement store lock poisoned".into()))?;

        if inner.seen_payments.contains(&grant.payment_id) {
            return Ok(GrantOutcome::AlreadyGranted);
        }

        let user = inner.users.entry(grant.user_id.clone()).or_default();
        match grant.kind {
            ItemKind::Course => {
                if !user.enrolled_courses.contains(&grant.item_id) {
                    user.enrolled_courses.push(grant.item_id.clone());
                }
            }
            ItemKind::Plan => {
                user.active_plan = Some(PlanActivation {
                    plan_id: grant.item_id.clone(),
                    activated_at: grant.granted_at,
                    expires_at: grant.expires_at,
                });
            }
        }
        inner.seen_payments.insert(grant.payment_id.clone());

        Ok(GrantOutcome::Created)
    }

    fn enrolled_courses(&self, user_id: &str) -> Result<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| PaymentError::Storage("entitlement store lock poisoned".into()))?;
        Ok(inner
            .users
            .get(user_id)
            .map(|u| u.enrolled_courses.clone())
            .unwrap_or_default())
    }

    fn active_plan(&self, user_id: &str) -> Result<Option<PlanActivation>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| PaymentError::Storage("entitlement store lock poisoned".into()))?;
        Ok(inner.users.get(user_id).and_then(|u| u.active_plan.clone()))
    }
}
