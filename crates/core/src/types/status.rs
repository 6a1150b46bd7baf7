//! Role enums shared by the storefront and the back office.

use serde::{Deserialize, Serialize};

/// Role of an authenticated backend account.
///
/// Also records who authored a support ticket or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shopper on one of the storefronts.
    #[default]
    Customer,
    /// Seller managing a single shop.
    Merchant,
    /// Platform administrator across all shops.
    #[serde(rename = "superadmin", alias = "super_admin")]
    SuperAdmin,
}

impl UserRole {
    /// Whether this role may sign in to the back office.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Merchant | Self::SuperAdmin)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Merchant => "Merchant",
            Self::SuperAdmin => "Superadmin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Merchant => write!(f, "merchant"),
            Self::SuperAdmin => write!(f, "superadmin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "merchant" => Ok(Self::Merchant),
            "superadmin" | "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_both_superadmin_spellings() {
        let a: UserRole = serde_json::from_str("\"superadmin\"").unwrap();
        let b: UserRole = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(a, UserRole::SuperAdmin);
        assert_eq!(b, UserRole::SuperAdmin);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"superadmin\"");
    }

    #[test]
    fn test_role_round_trips_through_display() {
        for role in [UserRole::Customer, UserRole::Merchant, UserRole::SuperAdmin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_staff_roles() {
        assert!(!UserRole::Customer.is_staff());
        assert!(UserRole::Merchant.is_staff());
        assert!(UserRole::SuperAdmin.is_staff());
    }
}
