//! Orders as the customer and the merchant see them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderId, OrderItemId, ProductId, ShopId, VariantId};

/// Fulfilment status of an order.
///
/// Read case-insensitively from the backend. A status this app does not know
/// reads as [`OrderStatus::Open`] so one odd order cannot break a whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum OrderStatus {
    #[default]
    Open,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Steps of the tracking timeline, in order.
    pub const TIMELINE: [Self; 4] = [Self::Open, Self::Processing, Self::Shipped, Self::Delivered];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Order placed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Open => "bg-blue-100 text-blue-700",
            Self::Processing => "bg-yellow-100 text-yellow-700",
            Self::Shipped => "bg-indigo-100 text-indigo-700",
            Self::Delivered => "bg-green-100 text-green-700",
            Self::Cancelled => "bg-red-100 text-red-700",
        }
    }

    /// Position on the tracking timeline; cancelled orders are off it.
    #[must_use]
    pub const fn timeline_step(self) -> Option<usize> {
        match self {
            Self::Open => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Statuses a merchant may move an order to from this one.
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Check a merchant status change.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] when the move is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Customers may cancel only before the shop starts processing.
    #[must_use]
    pub const fn customer_can_cancel(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "pending" => Ok(Self::Open),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("This order can no longer be cancelled")]
    NotCancellable,
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// One purchased line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, alias = "order_item_id")]
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(alias = "product_name")]
    pub name: String,
    #[serde(default)]
    pub variant_label: Option<String>,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Trim every field and check the required ones.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::MissingField`] for the first blank required field.
    pub fn normalized(&self) -> Result<Self, OrderError> {
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(OrderError::MissingField(field))
            } else {
                Ok(value.to_string())
            }
        };
        Ok(Self {
            full_name: required(&self.full_name, "Full name")?,
            phone: required(&self.phone, "Phone")?,
            line1: required(&self.line1, "Address")?,
            line2: self
                .line2
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            city: required(&self.city, "City")?,
            postal_code: self.postal_code.trim().to_string(),
            country: required(&self.country, "Country")?,
        })
    }

    /// Single-line rendering for order summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref() {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        if !self.postal_code.is_empty() {
            parts.push(self.postal_code.as_str());
        }
        if !self.country.is_empty() {
            parts.push(self.country.as_str());
        }
        parts.join(", ")
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    #[serde(alias = "changed_at")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "order_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Number shown to people, e.g. "#1042".
    #[must_use]
    pub fn display_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether any line is the product itself or one of its variants.
    ///
    /// Some backends record the variant id in the item's product id field, so
    /// variant ids are compared against both.
    #[must_use]
    pub fn contains_product(&self, product: ProductId, variants: &[VariantId]) -> bool {
        self.items.iter().any(|item| {
            item.product_id == product
                || variants
                    .iter()
                    .any(|v| v.as_i64() == item.product_id.as_i64() || Some(*v) == item.variant_id)
        })
    }

    /// Timeline for the tracking page.
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineStep> {
        let current = self.status.timeline_step();
        OrderStatus::TIMELINE
            .iter()
            .enumerate()
            .map(|(i, status)| TimelineStep {
                label: status.label(),
                done: current.is_some_and(|c| i <= c),
                current: current == Some(i),
                at: self
                    .status_history
                    .iter()
                    .rev()
                    .find(|h| h.status == *status)
                    .map(|h| h.at),
            })
            .collect()
    }
}

/// One step of the tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStep {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
    pub at: Option<DateTime<Utc>>,
}

/// Line of a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// Order placement payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    pub shop_id: ShopId,
    pub items: Vec<CheckoutLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn order_with(items: Vec<OrderItem>) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "status": "pending",
            "items": items,
        }))
        .unwrap()
    }

    fn item(product: i64, variant: Option<i64>) -> OrderItem {
        OrderItem {
            id: None,
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
            name: "Tee".into(),
            variant_label: None,
            quantity: 2,
            unit_price: Decimal::new(1050, 2),
            image_url: None,
        }
    }

    #[test]
    fn test_pending_is_open() {
        let order = order_with(vec![]);
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.display_number(), "#1");
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Open);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_reads_any_case_and_tolerates_unknown_values() {
        let statuses: Vec<OrderStatus> =
            serde_json::from_str(r#"["Delivered", "SHIPPED", "canceled", "returned"]"#).unwrap();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Delivered,
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
                OrderStatus::Open,
            ]
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
    }

    #[test]
    fn test_merchant_transitions() {
        use OrderStatus::*;
        assert!(Open.can_transition_to(Processing));
        assert!(Open.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Open.can_transition_to(Delivered));
        for status in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(status));
            assert!(!Cancelled.can_transition_to(status));
        }
        assert_eq!(
            Delivered.transition(Open),
            Err(OrderError::InvalidTransition {
                from: Delivered,
                to: Open
            })
        );
    }

    #[test]
    fn test_customer_cancel_only_while_open() {
        assert!(OrderStatus::Open.customer_can_cancel());
        assert!(!OrderStatus::Processing.customer_can_cancel());
        assert!(!OrderStatus::Delivered.customer_can_cancel());
    }

    #[test]
    fn test_contains_product_matches_variant_ids() {
        let order = order_with(vec![item(10, None), item(55, Some(77))]);
        assert!(order.contains_product(ProductId::new(10), &[]));
        assert!(order.contains_product(ProductId::new(99), &[VariantId::new(77)]));
        assert!(order.contains_product(ProductId::new(99), &[VariantId::new(55)]));
        assert!(!order.contains_product(ProductId::new(99), &[VariantId::new(1)]));
        assert_eq!(order.item_count(), 4);
        assert_eq!(order.items[0].line_total(), Decimal::new(2100, 2));
    }

    #[test]
    fn test_timeline_marks_progress() {
        let mut order = order_with(vec![]);
        order.status = OrderStatus::Shipped;
        let steps = order.timeline();
        assert_eq!(steps.len(), 4);
        assert!(steps[2].done && steps[2].current);
        assert!(steps[0].done && !steps[0].current);
        assert!(!steps[3].done);

        order.status = OrderStatus::Cancelled;
        assert!(order.timeline().iter().all(|s| !s.done));
    }

    #[test]
    fn test_address_normalization() {
        let address = ShippingAddress {
            full_name: " Ada ".into(),
            phone: "555".into(),
            line1: "1 Main St".into(),
            line2: Some("  ".into()),
            city: "Dhaka".into(),
            postal_code: "1207".into(),
            country: "BD".into(),
        };
        let normalized = address.normalized().unwrap();
        assert_eq!(normalized.full_name, "Ada");
        assert_eq!(normalized.line2, None);
        assert_eq!(normalized.one_line(), "1 Main St, Dhaka, 1207, BD");

        let missing = ShippingAddress {
            city: String::new(),
            ..address
        };
        assert_eq!(missing.normalized(), Err(OrderError::MissingField("City")));
    }
}
