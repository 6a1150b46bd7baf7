//! Merchant-editable shop settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::is_http_url;
use crate::Email;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Shop name is required")]
    EmptyName,
    #[error("Shop name must be at most {0} characters")]
    NameTooLong(usize),
    #[error("Contact email is invalid: {0}")]
    InvalidEmail(String),
    #[error("Color must look like #1a2b3c")]
    InvalidColor,
    #[error("Logo must be an http(s) URL")]
    InvalidLogoUrl,
    #[error("Fees cannot be negative")]
    NegativeAmount,
}

/// Settings as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    #[serde(alias = "shop_name")]
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub free_shipping_threshold: Option<Decimal>,
}

impl ShopSettings {
    pub const MAX_NAME_LENGTH: usize = 100;

    /// Trim and check every field, returning the cleaned settings.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<Self, SettingsError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SettingsError::EmptyName);
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(SettingsError::NameTooLong(Self::MAX_NAME_LENGTH));
        }

        let email = Email::parse(&self.contact_email)
            .map_err(|e| SettingsError::InvalidEmail(e.to_string()))?;

        let primary_color = blank_to_none(self.primary_color.as_deref());
        if primary_color.as_deref().is_some_and(|c| !is_hex_color(c)) {
            return Err(SettingsError::InvalidColor);
        }

        let logo_url = blank_to_none(self.logo_url.as_deref());
        if logo_url.as_deref().is_some_and(|u| !is_http_url(u)) {
            return Err(SettingsError::InvalidLogoUrl);
        }

        if self.shipping_fee.is_sign_negative()
            || self.free_shipping_threshold.is_some_and(|t| t.is_sign_negative())
        {
            return Err(SettingsError::NegativeAmount);
        }

        Ok(Self {
            name: name.to_string(),
            contact_email: email.into_inner(),
            contact_phone: blank_to_none(self.contact_phone.as_deref()),
            address: blank_to_none(self.address.as_deref()),
            logo_url,
            primary_color: primary_color.map(|c| c.to_ascii_lowercase()),
            shipping_fee: self.shipping_fee,
            free_shipping_threshold: self.free_shipping_threshold,
        })
    }
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// `#RRGGBB`
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> ShopSettings {
        ShopSettings {
            name: " Corner Shop ".into(),
            contact_email: "owner@Corner.Example".into(),
            contact_phone: Some(String::new()),
            address: None,
            logo_url: None,
            primary_color: Some("#1A2B3C".into()),
            shipping_fee: Decimal::new(5, 0),
            free_shipping_threshold: None,
        }
    }

    #[test]
    fn test_valid_settings_are_cleaned() {
        let clean = settings().validate().unwrap();
        assert_eq!(clean.name, "Corner Shop");
        assert_eq!(clean.contact_email, "owner@corner.example");
        assert_eq!(clean.contact_phone, None);
        assert_eq!(clean.primary_color.as_deref(), Some("#1a2b3c"));
    }

    #[test]
    fn test_invalid_fields() {
        let bad_color = ShopSettings {
            primary_color: Some("blue".into()),
            ..settings()
        };
        assert_eq!(bad_color.validate(), Err(SettingsError::InvalidColor));

        let negative = ShopSettings {
            shipping_fee: Decimal::new(-1, 0),
            ..settings()
        };
        assert_eq!(negative.validate(), Err(SettingsError::NegativeAmount));

        let bad_email = ShopSettings {
            contact_email: "nope".into(),
            ..settings()
        };
        assert!(matches!(bad_email.validate(), Err(SettingsError::InvalidEmail(_))));
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#00ffAA"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("00ffaa"));
    }
}
