//! Back-office accounts managed by the superadmin.

use serde::{Deserialize, Serialize};

use crate::{Email, ShopId, UserId, UserRole};

/// A merchant or superadmin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    #[serde(alias = "user_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Name is required")]
    EmptyName,
    #[error("Email is invalid: {0}")]
    InvalidEmail(String),
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("Only merchant and superadmin accounts can be created here")]
    NotStaffRole,
    #[error("Merchant accounts need a shop")]
    MissingShop,
}

/// Create-account form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAdminAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

/// Validated create-account payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminAccountInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub shop_id: Option<ShopId>,
}

impl NewAdminAccount {
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<AdminAccountInput, AccountError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }
        let email =
            Email::parse(&self.email).map_err(|e| AccountError::InvalidEmail(e.to_string()))?;
        if self.password.chars().count() < Self::MIN_PASSWORD_LENGTH {
            return Err(AccountError::PasswordTooShort(Self::MIN_PASSWORD_LENGTH));
        }
        if !self.role.is_staff() {
            return Err(AccountError::NotStaffRole);
        }
        if self.role == UserRole::Merchant && self.shop_id.is_none() {
            return Err(AccountError::MissingShop);
        }
        Ok(AdminAccountInput {
            name: name.to_string(),
            email: email.into_inner(),
            password: self.password.clone(),
            role: self.role,
            shop_id: self.shop_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> NewAdminAccount {
        NewAdminAccount {
            name: "Sam".into(),
            email: "sam@shop.example".into(),
            password: "correct horse".into(),
            role: UserRole::Merchant,
            shop_id: Some(ShopId::new(2)),
        }
    }

    #[test]
    fn test_valid_merchant() {
        let input = form().validate().unwrap();
        assert_eq!(input.role, UserRole::Merchant);
        assert_eq!(input.shop_id, Some(ShopId::new(2)));
    }

    #[test]
    fn test_rules() {
        let short = NewAdminAccount {
            password: "short".into(),
            ..form()
        };
        assert_eq!(short.validate(), Err(AccountError::PasswordTooShort(8)));

        let customer = NewAdminAccount {
            role: UserRole::Customer,
            ..form()
        };
        assert_eq!(customer.validate(), Err(AccountError::NotStaffRole));

        let no_shop = NewAdminAccount {
            shop_id: None,
            ..form()
        };
        assert_eq!(no_shop.validate(), Err(AccountError::MissingShop));

        let superadmin = NewAdminAccount {
            role: UserRole::SuperAdmin,
            shop_id: None,
            ..form()
        };
        assert!(superadmin.validate().is_ok());
    }
}
