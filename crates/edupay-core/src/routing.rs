//! Post-Payment Routing
//!
//! Pure lookup from role to dashboard path, plus the login redirect used when
//! an unauthenticated user hits checkout.

use crate::catalog::ItemKind;
use crate::session::Role;

/// Dashboard path for a role; absent or unknown roles land on the student dashboard.
pub fn dashboard_path(role: Option<Role>) -> &'static str {
    match role.unwrap_or_default() {
        Role::Student => "/student/dashboard",
        Role::School => "/school/dashboard",
        Role::Teacher => "/teacher/dashboard",
        Role::Govt => "/govt/dashboard",
        Role::Superadmin => "/admin/dashboard",
        Role::Helpsupport => "/helpsupport/dashboard",
    }
}

/// Login redirect that resumes checkout for `(kind, id)` after sign-in.
pub fn login_redirect(kind: ItemKind, id: &str) -> String {
    format!("/login?redirect=/checkout/{kind}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_maps_to_a_path() {
        let roles = [
            Role::Student,
            Role::School,
            Role::Teacher,
            Role::Govt,
            Role::Superadmin,
            Role::Helpsupport,
        ];
        for role in roles {
            assert!(!dashboard_path(Some(role)).is_empty());
        }
        assert_eq!(dashboard_path(Some(Role::Superadmin)), "/admin/dashboard");
    }

    #[test]
    fn test_absent_role_defaults_to_student() {
        assert_eq!(dashboard_path(None), "/student/dashboard");
    }

    #[test]
    fn test_login_redirect_resumes_checkout() {
        assert_eq!(
            login_redirect(ItemKind::Course, "abc123"),
            "/login?redirect=/checkout/course/abc123"
        );
    }
}
