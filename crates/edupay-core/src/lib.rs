//! # edupay-core
//!
//! Domain model for the edupay checkout service: the purchasable-item catalog
//! (static plans plus a course store), integer minor-unit money math, user
//! sessions/roles, and post-payment dashboard routing.
//!
//! This crate owns no I/O beyond the store traits it defines; the payment
//! gateway and HTTP surface live in `edupay-payments` and `edupay-server`.

pub mod catalog;
pub mod error;
pub mod money;
pub mod routing;
pub mod session;

pub use catalog::{
    CatalogResolver, CourseRecord, CourseStore, ItemKind, MemoryCourseStore, PurchasableItem,
    plan_catalog,
};
pub use error::{CoreError, Result};
pub use money::{DEFAULT_TAX_RATE_PERCENT, MinorUnits};
pub use routing::{dashboard_path, login_redirect};
pub use session::{MemorySessionStore, Role, SessionStore, User};
