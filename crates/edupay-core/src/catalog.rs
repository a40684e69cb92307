//! Purchasable Item Catalog
//!
//! Resolves checkout targets to priced items. Plans come from a small static
//! catalog; courses come from a `CourseStore`. Records crossing the store
//! boundary are validated before they become a `PurchasableItem` — malformed
//! payloads are rejected, not propagated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{CoreError, Result};

/// What a checkout is buying
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Plan,
    Course,
}

impl ItemKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemKind::Plan => "plan",
            ItemKind::Course => "course",
        }
    }

    /// Parse from a path segment; unknown kinds are a resolution miss, not a default.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plan" => Some(ItemKind::Plan),
            "course" => Some(ItemKind::Course),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced, described item snapshotted at checkout time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchasableItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    /// Price in major currency units
    pub price: Decimal,
    pub features: Vec<String>,
    /// How long a plan stays active once granted; `None` for courses
    pub validity_days: Option<i64>,
}

impl PurchasableItem {
    /// Validate a record fetched across the store boundary.
    fn validated(self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(CoreError::MalformedItem("empty id".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::MalformedItem(format!("item {}: empty name", self.id)));
        }
        if self.price < Decimal::ZERO {
            return Err(CoreError::MalformedItem(format!(
                "item {}: negative price {}",
                self.id, self.price
            )));
        }
        Ok(self)
    }
}

/// Raw course record as stored/fetched, before boundary validation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub features: Vec<String>,
}

impl TryFrom<CourseRecord> for PurchasableItem {
    type Error = CoreError;

    fn try_from(record: CourseRecord) -> Result<Self> {
        PurchasableItem {
            id: record.id,
            kind: ItemKind::Course,
            name: record.title,
            price: record.price,
            features: record.features,
            validity_days: None,
        }
        .validated()
    }
}

/// Static subscription plan catalog
pub fn plan_catalog() -> Vec<PurchasableItem> {
    vec![
        PurchasableItem {
            id: "basic".into(),
            kind: ItemKind::Plan,
            name: "Basic".into(),
            price: dec!(4999),
            features: vec![
                "Up to 200 students".into(),
                "Lead tracker".into(),
                "Email support".into(),
            ],
            validity_days: Some(365),
        },
        PurchasableItem {
            id: "standard".into(),
            kind: ItemKind::Plan,
            name: "Standard".into(),
            price: dec!(9999),
            features: vec![
                "Up to 1000 students".into(),
                "Lead tracker and CRM".into(),
                "Certificate delivery".into(),
                "Priority support".into(),
            ],
            validity_days: Some(365),
        },
        PurchasableItem {
            id: "premium".into(),
            kind: ItemKind::Plan,
            name: "Premium".into(),
            price: dec!(19999),
            features: vec![
                "Unlimited students".into(),
                "Full CRM and analytics".into(),
                "Certificate delivery".into(),
                "Dedicated account manager".into(),
            ],
            validity_days: Some(365),
        },
    ]
}

/// Course storage trait
pub trait CourseStore: Send + Sync {
    /// Fetch a raw course record by id
    fn get(&self, id: &str) -> Result<Option<CourseRecord>>;

    /// Save or update a course record
    fn save(&self, record: &CourseRecord) -> Result<()>;
}

/// In-memory course store (for development and tests)
pub struct MemoryCourseStore {
    courses: RwLock<HashMap<String, CourseRecord>>,
}

impl Default for MemoryCourseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCourseStore {
    pub fn new() -> Self {
        Self {
            courses: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a handful of demo courses so the server runs end to end
    pub fn with_demo_courses() -> Self {
        let store = Self::new();
        let demo = [
            CourseRecord {
                id: "abc123".into(),
                title: "Spoken English Foundation".into(),
                price: dec!(1499),
                features: vec!["24 video lessons".into(), "Completion certificate".into()],
            },
            CourseRecord {
                id: "math-olympiad".into(),
                title: "Math Olympiad Prep".into(),
                price: dec!(2999),
                features: vec!["40 problem sets".into(), "Live doubt sessions".into()],
            },
            CourseRecord {
                id: "python-junior".into(),
                title: "Python for Juniors".into(),
                price: dec!(1999),
                features: vec!["Project-based".into(), "Completion certificate".into()],
            },
        ];
        for record in demo {
            let _ = store.save(&record);
        }
        store
    }
}

impl CourseStore for MemoryCourseStore {
    fn get(&self, id: &str) -> Result<Option<CourseRecord>> {
        let courses = self
            .courses
            .read()
            .map_err(|_| CoreError::Storage("course store lock poisoned".into()))?;
        Ok(courses.get(id).cloned())
    }

    fn save(&self, record: &CourseRecord) -> Result<()> {
        let mut courses = self
            .courses
            .write()
            .map_err(|_| CoreError::Storage("course store lock poisoned".into()))?;
        courses.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

/// Resolves `(kind, id)` checkout targets to purchasable items
pub struct CatalogResolver<S: CourseStore> {
    plans: Vec<PurchasableItem>,
    courses: Arc<S>,
}

impl<S: CourseStore> CatalogResolver<S> {
    pub fn new(courses: Arc<S>) -> Self {
        Self {
            plans: plan_catalog(),
            courses,
        }
    }

    /// List the static plan catalog
    pub fn plans(&self) -> &[PurchasableItem] {
        &self.plans
    }

    /// Resolve an item; a miss means the caller must not proceed to order creation.
    pub fn resolve(&self, kind: ItemKind, id: &str) -> Result<PurchasableItem> {
        let not_found = || CoreError::ItemNotFound {
            kind: kind.as_str().into(),
            id: id.into(),
        };

        match kind {
            ItemKind::Plan => self
                .plans
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(not_found),
            ItemKind::Course => {
                let record = self.courses.get(id)?.ok_or_else(not_found)?;
                record.try_into().inspect_err(|e| {
                    tracing::warn!(course_id = %id, "Rejected malformed course record: {}", e);
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CatalogResolver<MemoryCourseStore> {
        CatalogResolver::new(Arc::new(MemoryCourseStore::with_demo_courses()))
    }

    #[test]
    fn test_resolve_standard_plan() {
        let item = resolver().resolve(ItemKind::Plan, "standard").unwrap();
        assert_eq!(item.name, "Standard");
        assert_eq!(item.price, dec!(9999));
        assert_eq!(item.validity_days, Some(365));
    }

    #[test]
    fn test_resolve_course() {
        let item = resolver().resolve(ItemKind::Course, "abc123").unwrap();
        assert_eq!(item.kind, ItemKind::Course);
        assert_eq!(item.name, "Spoken English Foundation");
        assert!(item.price > Decimal::ZERO);
    }

    #[test]
    fn test_all_catalog_items_priced() {
        let resolver = resolver();
        for plan in resolver.plans() {
            assert!(plan.price > Decimal::ZERO, "plan {} has no price", plan.id);
        }
        for id in ["abc123", "math-olympiad", "python-junior"] {
            let item = resolver.resolve(ItemKind::Course, id).unwrap();
            assert!(item.price > Decimal::ZERO, "course {id} has no price");
        }
    }

    #[test]
    fn test_resolve_miss() {
        let err = resolver().resolve(ItemKind::Course, "no-such").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound { .. }));

        let err = resolver().resolve(ItemKind::Plan, "enterprise").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound { .. }));
    }

    #[test]
    fn test_malformed_course_rejected() {
        let store = Arc::new(MemoryCourseStore::new());
        store
            .save(&CourseRecord {
                id: "bad".into(),
                title: "  ".into(),
                price: dec!(100),
                features: vec![],
            })
            .unwrap();
        store
            .save(&CourseRecord {
                id: "negative".into(),
                title: "Negative".into(),
                price: dec!(-1),
                features: vec![],
            })
            .unwrap();

        let resolver = CatalogResolver::new(store);
        assert!(matches!(
            resolver.resolve(ItemKind::Course, "bad"),
            Err(CoreError::MalformedItem(_))
        ));
        assert!(matches!(
            resolver.resolve(ItemKind::Course, "negative"),
            Err(CoreError::MalformedItem(_))
        ));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ItemKind::parse("plan"), Some(ItemKind::Plan));
        assert_eq!(ItemKind::parse("Course"), Some(ItemKind::Course));
        assert_eq!(ItemKind::parse("bundle"), None);
    }
}
