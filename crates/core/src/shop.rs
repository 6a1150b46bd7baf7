//! Tenants: the shops served by one storefront deployment.
//!
//! Each shop is reached through one or more hostnames. Requests for a host
//! that no shop claims are served by the default shop.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, Price, ShopId};

/// Colors and hero content for a shop's pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopTheme {
    pub primary_color: String,
    pub accent_color: String,
    pub logo_url: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub hero_image_url: Option<String>,
}

impl Default for ShopTheme {
    fn default() -> Self {
        Self {
            primary_color: "#4f46e5".to_string(),
            accent_color: "#f59e0b".to_string(),
            logo_url: None,
            hero_title: None,
            hero_subtitle: None,
            hero_image_url: None,
        }
    }
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    #[serde(default)]
    pub flat_fee: Decimal,
    #[serde(default)]
    pub free_over: Option<Decimal>,
}

impl ShippingPolicy {
    /// Shipping charged for a subtotal. Empty carts ship free.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO || self.free_over.is_some_and(|t| subtotal >= t) {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }
}

/// One tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub theme: ShopTheme,
    #[serde(default)]
    pub shipping: ShippingPolicy,
    #[serde(default)]
    pub support_email: Option<String>,
    /// Upper end of the price filter slider, in whole currency units.
    #[serde(default = "default_price_ceiling")]
    pub price_filter_ceiling: i64,
}

const fn default_price_ceiling() -> i64 {
    1000
}

impl Shop {
    #[must_use]
    pub const fn price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.currency)
    }

    /// Formatted amount in the shop's currency.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        self.price(amount).display()
    }
}

/// Shape of the shops file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopsFile {
    pub default: String,
    pub shops: Vec<Shop>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopConfigError {
    #[error("no shops configured")]
    Empty,
    #[error("duplicate shop id {0}")]
    DuplicateId(ShopId),
    #[error("duplicate shop slug '{0}'")]
    DuplicateSlug(String),
    #[error("hostname '{0}' is claimed by more than one shop")]
    DuplicateHost(String),
    #[error("shop slug '{0}' may only contain lowercase letters, digits and dashes")]
    InvalidSlug(String),
    #[error("default shop '{0}' is not defined")]
    UnknownDefault(String),
    #[error("shop '{0}' has a non-positive price filter ceiling")]
    InvalidPriceCeiling(String),
    #[error("shop '{0}' has an invalid theme color '{1}', expected #rgb or #rrggbb")]
    InvalidColor(String, String),
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Validated set of shops with host lookup.
#[derive(Debug, Clone)]
pub struct ShopRegistry {
    shops: Vec<Shop>,
    default: Shop,
}

impl ShopRegistry {
    /// Validate and index shop definitions. Hostnames are lower-cased.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate or invalid entry found.
    pub fn new(mut shops: Vec<Shop>, default_slug: &str) -> Result<Self, ShopConfigError> {
        if shops.is_empty() {
            return Err(ShopConfigError::Empty);
        }

        let mut ids = HashSet::new();
        let mut slugs = HashSet::new();
        let mut hosts = HashSet::new();
        for shop in &mut shops {
            if !ids.insert(shop.id) {
                return Err(ShopConfigError::DuplicateId(shop.id));
            }
            let valid_slug = !shop.slug.is_empty()
                && shop
                    .slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !valid_slug {
                return Err(ShopConfigError::InvalidSlug(shop.slug.clone()));
            }
            if !slugs.insert(shop.slug.clone()) {
                return Err(ShopConfigError::DuplicateSlug(shop.slug.clone()));
            }
            if shop.price_filter_ceiling <= 0 {
                return Err(ShopConfigError::InvalidPriceCeiling(shop.slug.clone()));
            }
            // Colors are written into a style block.
            for color in [&shop.theme.primary_color, &shop.theme.accent_color] {
                if !is_hex_color(color) {
                    return Err(ShopConfigError::InvalidColor(
                        shop.slug.clone(),
                        color.clone(),
                    ));
                }
            }
            for host in &mut shop.hosts {
                *host = normalize_host(host);
                if !hosts.insert(host.clone()) {
                    return Err(ShopConfigError::DuplicateHost(host.clone()));
                }
            }
        }

        let default = shops
            .iter()
            .find(|s| s.slug == default_slug)
            .cloned()
            .ok_or_else(|| ShopConfigError::UnknownDefault(default_slug.to_string()))?;

        Ok(Self { shops, default })
    }

    /// Build from a parsed shops file.
    ///
    /// # Errors
    ///
    /// See [`ShopRegistry::new`].
    pub fn from_file(file: ShopsFile) -> Result<Self, ShopConfigError> {
        Self::new(file.shops, &file.default)
    }

    /// Shop serving a `Host` header value.
    #[must_use]
    pub fn resolve(&self, host: Option<&str>) -> &Shop {
        host.map(normalize_host)
            .and_then(|h| self.shops.iter().find(|s| s.hosts.contains(&h)))
            .unwrap_or_else(|| self.default_shop())
    }

    #[must_use]
    pub const fn default_shop(&self) -> &Shop {
        &self.default
    }

    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&Shop> {
        self.shops.iter().find(|s| s.slug == slug)
    }

    #[must_use]
    pub fn by_id(&self, id: ShopId) -> Option<&Shop> {
        self.shops.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn shops(&self) -> &[Shop] {
        &self.shops
    }
}

/// Lower-case a host and strip any port.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        // IPv6 literal: keep up to the closing bracket
        host.split_once(']')
            .map_or(host, |(addr, _)| addr)
            .trim_start_matches('[')
    } else {
        host.rsplit_once(':').map_or(host, |(name, _)| name)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop(id: i64, slug: &str, hosts: &[&str]) -> Shop {
        Shop {
            id: ShopId::new(id),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            hosts: hosts.iter().map(|h| (*h).to_string()).collect(),
            currency: CurrencyCode::USD,
            theme: ShopTheme::default(),
            shipping: ShippingPolicy::default(),
            support_email: None,
            price_filter_ceiling: 500,
        }
    }

    #[test]
    fn test_resolve_by_host_with_port_and_case() {
        let registry = ShopRegistry::new(
            vec![shop(1, "acme", &["acme.test"]), shop(2, "zeta", &["Zeta.Test"])],
            "acme",
        )
        .unwrap();
        assert_eq!(registry.resolve(Some("ZETA.test:3000")).slug, "zeta");
        assert_eq!(registry.resolve(Some("acme.test")).slug, "acme");
    }

    #[test]
    fn test_unknown_host_falls_back_to_default() {
        let registry =
            ShopRegistry::new(vec![shop(1, "acme", &["acme.test"]), shop(2, "zeta", &[])], "zeta")
                .unwrap();
        assert_eq!(registry.resolve(Some("elsewhere.test")).slug, "zeta");
        assert_eq!(registry.resolve(None).slug, "zeta");
    }

    #[test]
    fn test_rejects_duplicates_and_bad_default() {
        assert_eq!(
            ShopRegistry::new(vec![shop(1, "a", &[]), shop(1, "b", &[])], "a").unwrap_err(),
            ShopConfigError::DuplicateId(ShopId::new(1))
        );
        assert_eq!(
            ShopRegistry::new(vec![shop(1, "a", &[]), shop(2, "a", &[])], "a").unwrap_err(),
            ShopConfigError::DuplicateSlug("a".into())
        );
        assert_eq!(
            ShopRegistry::new(vec![shop(1, "a", &["x.test"]), shop(2, "b", &["X.test:80"])], "a")
                .unwrap_err(),
            ShopConfigError::DuplicateHost("x.test".into())
        );
        assert_eq!(
            ShopRegistry::new(vec![shop(1, "a", &[])], "missing").unwrap_err(),
            ShopConfigError::UnknownDefault("missing".into())
        );
        assert_eq!(
            ShopRegistry::new(vec![], "a").unwrap_err(),
            ShopConfigError::Empty
        );
        assert_eq!(
            ShopRegistry::new(vec![shop(1, "Bad Slug", &[])], "Bad Slug").unwrap_err(),
            ShopConfigError::InvalidSlug("Bad Slug".into())
        );
    }

    #[test]
    fn test_theme_colors_must_be_hex() {
        let mut bad = shop(1, "a", &[]);
        bad.theme.accent_color = "red;}body{display:none".to_string();
        assert!(matches!(
            ShopRegistry::new(vec![bad], "a").unwrap_err(),
            ShopConfigError::InvalidColor(slug, _) if slug == "a"
        ));

        let mut short = shop(1, "a", &[]);
        short.theme.primary_color = "#FFF".to_string();
        assert!(ShopRegistry::new(vec![short], "a").is_ok());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Shop.Example.com:8080"), "shop.example.com");
        assert_eq!(normalize_host("[::1]:3000"), "::1");
        assert_eq!(normalize_host("localhost"), "localhost");
    }

    #[test]
    fn test_shipping_fee() {
        let policy = ShippingPolicy {
            flat_fee: Decimal::new(499, 2),
            free_over: Some(Decimal::new(50, 0)),
        };
        assert_eq!(policy.fee_for(Decimal::new(10, 0)), Decimal::new(499, 2));
        assert_eq!(policy.fee_for(Decimal::new(50, 0)), Decimal::ZERO);
        assert_eq!(policy.fee_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_shops_file_defaults() {
        let file: ShopsFile = serde_json::from_str(
            r#"{"default": "acme", "shops": [{"id": 1, "slug": "acme", "name": "Acme"}]}"#,
        )
        .unwrap();
        let registry = ShopRegistry::from_file(file).unwrap();
        let acme = registry.default_shop();
        assert_eq!(acme.price_filter_ceiling, 1000);
        assert_eq!(acme.theme.primary_color, "#4f46e5");
        assert_eq!(acme.format(Decimal::new(1999, 2)), "$19.99");
    }
}
