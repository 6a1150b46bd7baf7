//! Session-related types for admin authentication.

use std::fmt;

use bazaar_backend::AuthUser;
use bazaar_core::{ShopId, UserId, UserRole};
use serde::{Deserialize, Serialize};

/// Session-stored staff identity.
///
/// Holds the backend bearer token used for every dashboard call; `Debug`
/// output redacts it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Shop the merchant manages. Superadmins usually have none.
    pub shop_id: Option<ShopId>,
    token: String,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(user: AuthUser, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            shop_id: user.shop_id,
            token,
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    /// Landing page after sign-in: the shop dashboard when there is a shop
    /// to manage, the platform screens otherwise.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        match (self.role, self.shop_id) {
            (UserRole::SuperAdmin, None) => "/superadmin/admins",
            _ => "/",
        }
    }
}

impl fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("shop_id", &self.shop_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for a one-shot notice shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin(role: &str, shop_id: Option<i64>) -> CurrentAdmin {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Sam Seller",
            "email": "sam@shop.example",
            "role": role,
            "shop_id": shop_id,
        }))
        .unwrap();
        CurrentAdmin::new(user, "staff-token".to_string())
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", admin("merchant", Some(1)));
        assert!(debug.contains("sam@shop.example"));
        assert!(!debug.contains("staff-token"));
    }

    #[test]
    fn test_home_path_by_role() {
        assert_eq!(admin("merchant", Some(1)).home_path(), "/");
        assert_eq!(admin("superadmin", None).home_path(), "/superadmin/admins");
        assert_eq!(admin("superadmin", Some(2)).home_path(), "/");
        assert!(admin("superadmin", None).is_super_admin());
    }
}
