//! Types stored in the visitor's session.

use std::fmt;

use bazaar_backend::AuthUser;
use bazaar_core::{UserId, VisitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in shopper.
///
/// The backend bearer token lives only in the server-side session record;
/// `Debug` output redacts it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    token: String,
}

impl CurrentCustomer {
    #[must_use]
    pub fn new(user: AuthUser, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        }
    }

    /// Bearer token for backend calls made on the shopper's behalf.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// First word of the name, for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

impl fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Analytics visit of one shop within this session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisitState {
    /// Backend visit id; `None` when starting the visit failed.
    pub visit_id: Option<VisitId>,
    pub started_at: DateTime<Utc>,
}

impl VisitState {
    /// Whole seconds since the first page view, never negative.
    #[must_use]
    pub fn seconds_on_site(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in shopper.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for a one-shot message shown on the next page.
    pub const FLASH: &str = "flash";

    /// Key of the cart for one shop.
    #[must_use]
    pub fn cart(shop_slug: &str) -> String {
        format!("cart:{shop_slug}")
    }

    /// Key of the analytics visit for one shop.
    #[must_use]
    pub fn visit(shop_slug: &str) -> String {
        format!("visit:{shop_slug}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer() -> CurrentCustomer {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": 5,
            "name": "Ada Lovelace",
            "email": "ada@example.com"
        }))
        .unwrap();
        CurrentCustomer::new(user, "tok-123".to_string())
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", customer());
        assert!(debug.contains("Ada Lovelace"));
        assert!(!debug.contains("tok-123"));
    }

    #[test]
    fn test_first_name() {
        assert_eq!(customer().first_name(), "Ada");
    }

    #[test]
    fn test_seconds_on_site() {
        let started_at = "2024-01-01T10:00:00Z".parse().unwrap();
        let visit = VisitState {
            visit_id: None,
            started_at,
        };
        let later = "2024-01-01T10:02:05Z".parse().unwrap();
        assert_eq!(visit.seconds_on_site(later), 125);
        let earlier = "2024-01-01T09:00:00Z".parse().unwrap();
        assert_eq!(visit.seconds_on_site(earlier), 0);
    }

    #[test]
    fn test_per_shop_keys() {
        assert_eq!(keys::cart("acme"), "cart:acme");
        assert_eq!(keys::visit("acme"), "visit:acme");
    }
}
