//! Catalog types: products, variants, categories and brands.
//!
//! Shapes follow what the public shop endpoints return. Missing optional
//! fields deserialize to their defaults so partial records still render.

pub mod filter;
pub mod price_range;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{BrandId, CategoryId, ProductId, VariantId};

pub use filter::{ProductQuery, ProductSort};
pub use price_range::PriceRangeSlider;

/// Stock level at or below which a product shows as "low stock" when the
/// backend does not send its own threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Product image or media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Aggregated review score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

/// One attribute value of a variant (e.g. color = Blue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub value: String,
}

/// A specific attribute combination of a parent product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(alias = "variant_id")]
    pub id: VariantId,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub selling_price: Option<Decimal>,
    #[serde(default)]
    pub special_price: Option<Decimal>,
    #[serde(default)]
    pub stock_qty: i64,
    #[serde(default)]
    pub image: Option<ProductImage>,
}

impl Variant {
    /// Value of the named attribute, compared case-insensitively.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Label shown in carts and order lines, e.g. "Blue / M".
    #[must_use]
    pub fn label(&self) -> String {
        if self.attributes.is_empty() {
            return self.sku.clone();
        }
        self.attributes
            .iter()
            .map(|a| a.value.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_qty > 0
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "product_id")]
    pub id: ProductId,
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "media")]
    pub images: Vec<ProductImage>,
    pub price: Decimal,
    #[serde(default)]
    pub selling_price: Option<Decimal>,
    #[serde(default)]
    pub special_price: Option<Decimal>,
    #[serde(default)]
    pub stock_qty: i64,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub rating: Option<RatingSummary>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Resolve the price a shopper pays from the three price fields.
///
/// A special price only applies when it undercuts the base price.
fn effective(price: Decimal, selling: Option<Decimal>, special: Option<Decimal>) -> Decimal {
    match (special, selling) {
        (Some(special), _) if special > Decimal::ZERO && special < price => special,
        (_, Some(selling)) if selling > Decimal::ZERO => selling,
        _ => price,
    }
}

/// Discount from `compare_at` down to `price`, in whole percent rounded down.
fn percent_off(compare_at: Decimal, price: Decimal) -> Option<u32> {
    if compare_at <= Decimal::ZERO {
        return None;
    }
    let percent = ((compare_at - price) * Decimal::ONE_HUNDRED / compare_at).floor();
    percent.to_u32().filter(|p| *p > 0)
}

impl Product {
    /// Price the shopper pays.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective(self.price, self.selling_price, self.special_price)
    }

    /// Price of a variant, falling back to the product's prices.
    #[must_use]
    pub fn variant_price(&self, variant: &Variant) -> Decimal {
        let base = variant.price.unwrap_or(self.price);
        if variant.price.is_none()
            && variant.selling_price.is_none()
            && variant.special_price.is_none()
        {
            return self.effective_price();
        }
        effective(base, variant.selling_price, variant.special_price)
    }

    /// Struck-through price shown next to a discounted one.
    #[must_use]
    pub fn compare_at_price(&self) -> Option<Decimal> {
        (self.effective_price() < self.price).then_some(self.price)
    }

    /// Whole-percent discount, rounded down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        percent_off(self.compare_at_price()?, self.effective_price())
    }

    /// Struck-through price for a variant: its own base price (or the
    /// product's) when the variant sells below it.
    #[must_use]
    pub fn variant_compare_at(&self, variant: &Variant) -> Option<Decimal> {
        let base = variant.price.unwrap_or(self.price);
        (self.variant_price(variant) < base).then_some(base)
    }

    /// Whole-percent discount of a variant against [`Self::variant_compare_at`].
    #[must_use]
    pub fn variant_discount_percent(&self, variant: &Variant) -> Option<u32> {
        percent_off(self.variant_compare_at(variant)?, self.variant_price(variant))
    }

    /// Units available across variants, or the product's own stock when it
    /// has none.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        if self.variants.is_empty() {
            self.stock_qty.max(0)
        } else {
            self.variants.iter().map(|v| v.stock_qty.max(0)).sum()
        }
    }

    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(
            self.total_stock(),
            self.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
        )
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn variant_ids(&self) -> Vec<VariantId> {
        self.variants.iter().map(|v| v.id).collect()
    }
}

/// Availability bucket shown on product cards and the inventory screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    LowStock(i64),
    OutOfStock,
}

impl StockStatus {
    #[must_use]
    pub const fn from_quantity(quantity: i64, low_threshold: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= low_threshold {
            Self::LowStock(quantity)
        } else {
            Self::InStock
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::InStock => "In stock".to_string(),
            Self::LowStock(n) => format!("Only {n} left"),
            Self::OutOfStock => "Out of stock".to_string(),
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::InStock => "bg-green-100 text-green-700",
            Self::LowStock(_) => "bg-yellow-100 text-yellow-700",
            Self::OutOfStock => "bg-red-100 text-red-700",
        }
    }

    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

/// A product category used as a filter facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "category_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub product_count: Option<u32>,
}

/// A brand used as a filter facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(alias = "brand_id")]
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Category create/update errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("Category name is required")]
    EmptyName,
    #[error("Category name must be at most {0} characters")]
    NameTooLong(usize),
    #[error("Slug may only contain lowercase letters, digits and dashes")]
    InvalidSlug,
    #[error("Icon must be an http(s) URL")]
    InvalidIconUrl,
    #[error("A category cannot be its own parent")]
    SelfParent,
}

/// Form input for creating or renaming a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Validated category payload sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub icon_url: Option<String>,
    pub parent_id: Option<CategoryId>,
}

impl CategoryDraft {
    pub const MAX_NAME_LENGTH: usize = 80;

    /// Validate the draft, deriving the slug from the name when it is blank.
    ///
    /// `editing` is the id of the category being updated, if any.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self, editing: Option<CategoryId>) -> Result<CategoryInput, CategoryError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(CategoryError::NameTooLong(Self::MAX_NAME_LENGTH));
        }

        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => {
                let valid = slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
                if !valid || slug.starts_with('-') || slug.ends_with('-') {
                    return Err(CategoryError::InvalidSlug);
                }
                slug.to_string()
            }
            None => slugify(name),
        };
        if slug.is_empty() {
            return Err(CategoryError::InvalidSlug);
        }

        let icon_url = self
            .icon_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if icon_url.as_deref().is_some_and(|u| !is_http_url(u)) {
            return Err(CategoryError::InvalidIconUrl);
        }

        if editing.is_some() && editing == self.parent_id {
            return Err(CategoryError::SelfParent);
        }

        Ok(CategoryInput {
            name: name.to_string(),
            slug,
            icon_url,
            parent_id: self.parent_id,
        })
    }
}

/// Lower-case ASCII slug: alphanumerics kept, every other run collapsed to
/// one dash, no leading or trailing dash.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Whether a string looks like an absolute http(s) URL.
#[must_use]
pub fn is_http_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.starts_with('/') && !r.contains(char::is_whitespace))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(price: i64, selling: Option<i64>, special: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            sku: None,
            name: "Tee".to_string(),
            slug: None,
            short_description: None,
            description: None,
            images: vec![],
            price: Decimal::new(price, 0),
            selling_price: selling.map(|v| Decimal::new(v, 0)),
            special_price: special.map(|v| Decimal::new(v, 0)),
            stock_qty: 10,
            low_stock_threshold: None,
            category_id: None,
            brand_id: None,
            variants: vec![],
            rating: None,
            created_at: None,
        }
    }

    #[test]
    fn test_effective_price_precedence() {
        assert_eq!(product(100, None, None).effective_price(), Decimal::new(100, 0));
        assert_eq!(product(100, Some(80), None).effective_price(), Decimal::new(80, 0));
        assert_eq!(product(100, Some(80), Some(70)).effective_price(), Decimal::new(70, 0));
        // A special price above the base is ignored
        assert_eq!(product(100, Some(80), Some(120)).effective_price(), Decimal::new(80, 0));
    }

    #[test]
    fn test_discount_percent_rounds_down() {
        let p = product(30, Some(20), None);
        assert_eq!(p.compare_at_price(), Some(Decimal::new(30, 0)));
        assert_eq!(p.discount_percent(), Some(33));
        assert_eq!(product(30, None, None).discount_percent(), None);
    }

    fn priced_variant(price: Option<i64>, special: Option<i64>) -> Variant {
        Variant {
            id: VariantId::new(9),
            sku: String::new(),
            attributes: vec![],
            price: price.map(|v| Decimal::new(v, 0)),
            selling_price: None,
            special_price: special.map(|v| Decimal::new(v, 0)),
            stock_qty: 1,
            image: None,
        }
    }

    #[test]
    fn test_variant_discount_uses_variant_base_price() {
        // Product on special at 10 of 20, variant priced 40 on its own.
        let p = product(20, None, Some(10));
        let full_price = priced_variant(Some(40), None);
        assert_eq!(p.variant_price(&full_price), Decimal::new(40, 0));
        assert_eq!(p.variant_compare_at(&full_price), None);
        assert_eq!(p.variant_discount_percent(&full_price), None);

        let on_special = priced_variant(Some(40), Some(30));
        assert_eq!(p.variant_compare_at(&on_special), Some(Decimal::new(40, 0)));
        assert_eq!(p.variant_discount_percent(&on_special), Some(25));

        // A variant without prices inherits the product's discount.
        let inherits = priced_variant(None, None);
        assert_eq!(p.variant_compare_at(&inherits), Some(Decimal::new(20, 0)));
        assert_eq!(p.variant_discount_percent(&inherits), Some(50));
    }

    #[test]
    fn test_stock_status_buckets() {
        assert_eq!(StockStatus::from_quantity(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(-2, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(5, 5), StockStatus::LowStock(5));
        assert_eq!(StockStatus::from_quantity(6, 5), StockStatus::InStock);
        assert_eq!(StockStatus::LowStock(2).label(), "Only 2 left");
    }

    #[test]
    fn test_total_stock_sums_variants() {
        let mut p = product(10, None, None);
        p.variants = vec![
            Variant {
                id: VariantId::new(1),
                sku: "A".into(),
                attributes: vec![],
                price: None,
                selling_price: None,
                special_price: None,
                stock_qty: 2,
                image: None,
            },
            Variant {
                id: VariantId::new(2),
                sku: "B".into(),
                attributes: vec![],
                price: Some(Decimal::new(12, 0)),
                selling_price: None,
                special_price: None,
                stock_qty: -1,
                image: None,
            },
        ];
        assert_eq!(p.total_stock(), 2);
        assert_eq!(p.stock_status(), StockStatus::LowStock(2));
        assert_eq!(p.variant_price(&p.variants[0]), Decimal::new(10, 0));
        assert_eq!(p.variant_price(&p.variants[1]), Decimal::new(12, 0));
    }

    #[test]
    fn test_product_deserializes_sparse_payload() {
        let json = r#"{"product_id": 7, "name": "Mug", "price": "12.50"}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, ProductId::new(7));
        assert_eq!(p.price, Decimal::new(1250, 2));
        assert!(p.variants.is_empty());
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Men's  T-Shirts & Tops"), "men-s-t-shirts-tops");
        assert_eq!(slugify("  --Kitchen--  "), "kitchen");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_category_draft_validation() {
        let draft = CategoryDraft {
            name: " Home Decor ".into(),
            ..CategoryDraft::default()
        };
        let input = draft.validate(None).unwrap();
        assert_eq!(input.name, "Home Decor");
        assert_eq!(input.slug, "home-decor");

        let bad_slug = CategoryDraft {
            name: "Shoes".into(),
            slug: Some("Shoes!".into()),
            ..CategoryDraft::default()
        };
        assert_eq!(bad_slug.validate(None), Err(CategoryError::InvalidSlug));

        let self_parent = CategoryDraft {
            name: "Shoes".into(),
            parent_id: Some(CategoryId::new(3)),
            ..CategoryDraft::default()
        };
        assert_eq!(
            self_parent.validate(Some(CategoryId::new(3))),
            Err(CategoryError::SelfParent)
        );

        let bad_icon = CategoryDraft {
            name: "Shoes".into(),
            icon_url: Some("ftp://x".into()),
            ..CategoryDraft::default()
        };
        assert_eq!(bad_icon.validate(None), Err(CategoryError::InvalidIconUrl));
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://cdn.example.com/a.png"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("javascript:alert(1)"));
    }
}
