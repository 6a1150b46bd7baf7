//! Product reviews and the "did you buy this?" check that gates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::is_http_url;
use crate::order::{Order, OrderStatus};
use crate::{OrderId, ProductId, ReviewId, VariantId};

/// Most order-history pages the eligibility check will look at.
pub const MAX_ORDER_PAGES: u32 = 5;

/// Moderation state of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "bg-yellow-100 text-yellow-700",
            Self::Approved => "bg-green-100 text-green-700",
            Self::Rejected => "bg-red-100 text-red-700",
        }
    }
}

/// A submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(alias = "review_id")]
    pub id: ReviewId,
    pub product_id: ProductId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "comment")]
    pub body: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "user_name")]
    pub author_name: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Filled and empty star counts for display.
    #[must_use]
    pub fn stars(&self) -> (u8, u8) {
        let filled = self.rating.min(5);
        (filled, 5 - filled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating,
    #[error("Title is required")]
    EmptyTitle,
    #[error("Title must be at most {0} characters")]
    TitleTooLong(usize),
    #[error("Review text is required")]
    EmptyBody,
    #[error("Review text must be at most {0} characters")]
    BodyTooLong(usize),
    #[error("At most {0} images can be attached")]
    TooManyImages(usize),
    #[error("Image links must be http(s) URLs")]
    InvalidImageUrl,
}

/// Review form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Validated review payload, tied to the order that made the shopper eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSubmission {
    pub order_id: OrderId,
    pub rating: u8,
    pub title: String,
    pub body: String,
    pub images: Vec<String>,
}

impl ReviewDraft {
    pub const MAX_TITLE_LENGTH: usize = 120;
    pub const MAX_BODY_LENGTH: usize = 2000;
    pub const MAX_IMAGES: usize = 5;

    /// Check the draft and attach the eligible order.
    ///
    /// Blank image lines are dropped before counting.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self, order_id: OrderId) -> Result<ReviewSubmission, ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::InvalidRating);
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err(ReviewError::EmptyTitle);
        }
        if title.chars().count() > Self::MAX_TITLE_LENGTH {
            return Err(ReviewError::TitleTooLong(Self::MAX_TITLE_LENGTH));
        }

        let body = self.body.trim();
        if body.is_empty() {
            return Err(ReviewError::EmptyBody);
        }
        if body.chars().count() > Self::MAX_BODY_LENGTH {
            return Err(ReviewError::BodyTooLong(Self::MAX_BODY_LENGTH));
        }

        let images: Vec<String> = self
            .images
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if images.len() > Self::MAX_IMAGES {
            return Err(ReviewError::TooManyImages(Self::MAX_IMAGES));
        }
        if images.iter().any(|u| !is_http_url(u)) {
            return Err(ReviewError::InvalidImageUrl);
        }

        Ok(ReviewSubmission {
            order_id,
            rating: self.rating,
            title: title.to_string(),
            body: body.to_string(),
            images,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReviewEligibilityError {
    #[error("You can only review products from a delivered order")]
    NoDeliveredOrder,
}

/// Walks the shopper's order history one page at a time looking for a
/// delivered order that contains the product.
///
/// The caller fetches pages `1..=MAX_ORDER_PAGES`, feeds each to
/// [`scan_page`](Self::scan_page) and stops as soon as
/// [`wants_more`](Self::wants_more) is false.
#[derive(Debug, Clone)]
pub struct EligibilityScan {
    product_id: ProductId,
    variant_ids: Vec<VariantId>,
    pages_scanned: u32,
    exhausted: bool,
    best: Option<(OrderId, Option<DateTime<Utc>>)>,
}

impl EligibilityScan {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_ids: Vec<VariantId>) -> Self {
        Self {
            product_id,
            variant_ids,
            pages_scanned: 0,
            exhausted: false,
            best: None,
        }
    }

    /// Page number to request next, or `None` when the scan is over.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.wants_more() {
            Some(self.pages_scanned + 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn wants_more(&self) -> bool {
        !self.exhausted && self.pages_scanned < MAX_ORDER_PAGES
    }

    #[must_use]
    pub const fn pages_scanned(&self) -> u32 {
        self.pages_scanned
    }

    /// Consume one page of orders. `has_more` is false on the last page of
    /// the history.
    pub fn scan_page(&mut self, orders: &[Order], has_more: bool) {
        self.pages_scanned += 1;
        if !has_more || orders.is_empty() {
            self.exhausted = true;
        }

        for order in orders {
            if order.status != OrderStatus::Delivered
                || !order.contains_product(self.product_id, &self.variant_ids)
            {
                continue;
            }
            let newer = match &self.best {
                None => true,
                Some((_, best_at)) => order.created_at > *best_at,
            };
            if newer {
                self.best = Some((order.id, order.created_at));
            }
        }
    }

    /// Order that makes the shopper eligible.
    ///
    /// # Errors
    ///
    /// [`ReviewEligibilityError::NoDeliveredOrder`] when no delivered order
    /// in the scanned pages contains the product.
    pub fn outcome(&self) -> Result<OrderId, ReviewEligibilityError> {
        self.best
            .map(|(id, _)| id)
            .ok_or(ReviewEligibilityError::NoDeliveredOrder)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(id: i64, status: &str, product: i64, day: u32) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "status": status,
            "created_at": format!("2024-03-{day:02}T10:00:00Z"),
            "items": [{
                "product_id": product,
                "name": "Item",
                "quantity": 1,
                "unit_price": "5.00"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_single_delivered_match() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![]);
        scan.scan_page(
            &[order(1, "shipped", 7, 1), order(2, "delivered", 7, 2), order(3, "delivered", 8, 3)],
            false,
        );
        assert_eq!(scan.outcome(), Ok(OrderId::new(2)));
        assert!(!scan.wants_more());
    }

    #[test]
    fn test_no_match_reports_error_message() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![]);
        scan.scan_page(&[order(1, "processing", 7, 1)], false);
        let err = scan.outcome().unwrap_err();
        assert_eq!(err, ReviewEligibilityError::NoDeliveredOrder);
        assert_eq!(
            err.to_string(),
            "You can only review products from a delivered order"
        );
    }

    #[test]
    fn test_most_recent_match_wins_across_pages() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![]);
        scan.scan_page(&[order(1, "delivered", 7, 5)], true);
        scan.scan_page(&[order(2, "delivered", 7, 20), order(3, "delivered", 7, 9)], false);
        assert_eq!(scan.outcome(), Ok(OrderId::new(2)));
    }

    #[test]
    fn test_variant_ids_match_item_product_ids() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![VariantId::new(70)]);
        scan.scan_page(&[order(4, "delivered", 70, 1)], false);
        assert_eq!(scan.outcome(), Ok(OrderId::new(4)));
    }

    #[test]
    fn test_scan_stops_after_five_pages() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![]);
        let mut requested = Vec::new();
        while let Some(page) = scan.next_page() {
            requested.push(page);
            scan.scan_page(&[order(1, "open", 7, 1)], true);
        }
        assert_eq!(requested, vec![1, 2, 3, 4, 5]);
        assert_eq!(scan.pages_scanned(), MAX_ORDER_PAGES);
        assert!(scan.outcome().is_err());
    }

    #[test]
    fn test_scan_stops_on_empty_page() {
        let mut scan = EligibilityScan::new(ProductId::new(7), vec![]);
        scan.scan_page(&[], true);
        assert_eq!(scan.next_page(), None);
    }

    #[test]
    fn test_draft_validation() {
        let draft = ReviewDraft {
            rating: 4,
            title: " Great ".into(),
            body: "Fits well".into(),
            images: vec!["https://img.example.com/1.jpg".into(), " ".into()],
        };
        let submission = draft.validate(OrderId::new(3)).unwrap();
        assert_eq!(submission.title, "Great");
        assert_eq!(submission.images.len(), 1);

        let zero = ReviewDraft {
            rating: 0,
            ..draft.clone()
        };
        assert_eq!(zero.validate(OrderId::new(3)), Err(ReviewError::InvalidRating));

        let too_many = ReviewDraft {
            images: vec!["https://a.example/x.png".into(); 6],
            ..draft.clone()
        };
        assert_eq!(
            too_many.validate(OrderId::new(3)),
            Err(ReviewError::TooManyImages(5))
        );

        let long_title = ReviewDraft {
            title: "x".repeat(121),
            ..draft
        };
        assert_eq!(
            long_title.validate(OrderId::new(3)),
            Err(ReviewError::TitleTooLong(120))
        );
    }
}
