/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Every account carries exactly one of three roles. Each protected operation
 * names a static allow-list of roles; a caller passes the gate when its role
 * is in that list.
 */

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::{AuthError, AuthUser};

/// Closed set of account roles. Stored and compared in uppercase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Productos,
    Almacenes,
}

impl Role {
    /// Normalizing constructor: surrounding whitespace and letter case are ignored
    pub fn parse(raw: &str) -> Result<Self, UnknownRole> {
        Role::from_str(raw.trim()).map_err(|_| UnknownRole(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}', expected one of ADMIN, PRODUCTOS, ALMACENES")]
pub struct UnknownRole(pub String);

/// Static allow-lists, one per protected operation group
pub mod allow {
    use super::Role;

    pub const USERS_CREATE: &[Role] = &[Role::Admin];
    pub const PRODUCTS_WRITE: &[Role] = &[Role::Admin, Role::Productos];
    pub const WAREHOUSES_WRITE: &[Role] = &[Role::Admin, Role::Almacenes];
    pub const ADMIN_PAGE: &[Role] = &[Role::Admin];
    pub const ANY_AUTHENTICATED: &[Role] = &[Role::Admin, Role::Productos, Role::Almacenes];
}

/// Decides whether `caller` may run an operation guarded by `allowed`.
///
/// An absent identity is always `MissingAuth`, checked before any role
/// comparison, so it never shows up as a permission failure.
pub fn authorize(caller: Option<&AuthUser>, allowed: &[Role]) -> Result<(), AuthError> {
    let user = caller.ok_or(AuthError::MissingAuth)?;
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            name: "tester".into(),
            role,
        }
    }

    #[rstest]
    #[case("ADMIN", Role::Admin)]
    #[case("admin", Role::Admin)]
    #[case("  Productos ", Role::Productos)]
    #[case("almacenes", Role::Almacenes)]
    fn parse_normalizes_case_and_whitespace(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::parse(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ventas")]
    #[case("ADMINS")]
    fn parse_rejects_unknown_roles(#[case] raw: &str) {
        assert_matches!(Role::parse(raw), Err(UnknownRole(_)));
    }

    #[test]
    fn display_is_uppercase() {
        assert_eq!(Role::Productos.to_string(), "PRODUCTOS");
        assert_eq!(Role::Almacenes.as_ref(), "ALMACENES");
    }

    #[test]
    fn exhaustive_role_by_allow_list_matrix() {
        let lists = [
            allow::USERS_CREATE,
            allow::PRODUCTS_WRITE,
            allow::WAREHOUSES_WRITE,
            allow::ADMIN_PAGE,
            allow::ANY_AUTHENTICATED,
        ];
        for list in lists {
            for role in Role::iter() {
                let outcome = authorize(Some(&user(role)), list);
                if list.contains(&role) {
                    assert!(outcome.is_ok(), "{role} should pass {list:?}");
                } else {
                    assert_matches!(outcome, Err(AuthError::InsufficientPermissions));
                }
            }
        }
    }

    #[rstest]
    #[case(Role::Admin, allow::PRODUCTS_WRITE, true)]
    #[case(Role::Productos, allow::PRODUCTS_WRITE, true)]
    #[case(Role::Almacenes, allow::PRODUCTS_WRITE, false)]
    #[case(Role::Productos, allow::WAREHOUSES_WRITE, false)]
    #[case(Role::Almacenes, allow::WAREHOUSES_WRITE, true)]
    #[case(Role::Productos, allow::USERS_CREATE, false)]
    fn documented_grants(#[case] role: Role, #[case] list: &[Role], #[case] allowed: bool) {
        assert_eq!(authorize(Some(&user(role)), list).is_ok(), allowed);
    }

    #[test]
    fn anonymous_caller_is_unauthenticated_not_forbidden() {
        assert_matches!(
            authorize(None, allow::ANY_AUTHENTICATED),
            Err(AuthError::MissingAuth)
        );
        assert_matches!(authorize(None, &[]), Err(AuthError::MissingAuth));
    }
}
