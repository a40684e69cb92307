//! User Sessions
//!
//! The auth boundary: a session exposes `{id, name, email, role}`. Checkout
//! requires a non-null session before order creation. Sessions are looked up
//! through a `SessionStore` capability injected into the server state rather
//! than read from ambient globals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CoreError, Result};

/// Dashboard role tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    School,
    Teacher,
    Govt,
    Superadmin,
    Helpsupport,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::School => "school",
            Role::Teacher => "teacher",
            Role::Govt => "govt",
            Role::Superadmin => "superadmin",
            Role::Helpsupport => "helpsupport",
        }
    }

    /// Unknown role strings fall back to `Student`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "school" => Role::School,
            "teacher" => Role::Teacher,
            "govt" => Role::Govt,
            "superadmin" => Role::Superadmin,
            "helpsupport" => Role::Helpsupport,
            _ => Role::Student,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

/// An authenticated user as exposed by the auth boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Phone number for payment widget prefill, if known
    #[serde(default)]
    pub contact: Option<String>,
}

/// Session lookup trait
pub trait SessionStore: Send + Sync {
    /// Resolve a bearer token to a user, `None` if the session is absent/expired
    fn user_for_token(&self, token: &str) -> Result<Option<User>>;

    /// Register a session token for a user
    fn insert(&self, token: &str, user: User) -> Result<()>;
}

/// In-memory session store (for development and tests)
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, User>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a demo session so the server runs end to end.
    ///
    /// Returns the bearer token for the seeded user.
    pub fn with_demo_user() -> (Self, String) {
        let store = Self::new();
        let token = uuid::Uuid::new_v4().to_string();
        let _ = store.insert(
            &token,
            User {
                id: "user-demo-1".into(),
                name: "Asha Verma".into(),
                email: "asha@example.com".into(),
                role: Role::Student,
                contact: Some("+919876543210".into()),
            },
        );
        (store, token)
    }
}

impl SessionStore for MemorySessionStore {
    fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CoreError::Storage("session store lock poisoned".into()))?;
        Ok(sessions.get(token).cloned())
    }

    fn insert(&self, token: &str, user: User) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CoreError::Storage("session store lock poisoned".into()))?;
        sessions.insert(token.to_string(), user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("superadmin"), Role::Superadmin);
        assert_eq!(Role::from_str("GOVT"), Role::Govt);
        assert_eq!(Role::from_str("unknown"), Role::Student);
        assert_eq!(Role::from_str(""), Role::Student);
    }

    #[test]
    fn test_session_lookup() {
        let (store, token) = MemorySessionStore::with_demo_user();
        let user = store.user_for_token(&token).unwrap().unwrap();
        assert_eq!(user.role, Role::Student);
        assert!(store.user_for_token("nope").unwrap().is_none());
    }
}
