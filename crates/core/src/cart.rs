//! Shopping cart kept in the visitor's session, one per shop.
//!
//! The backend re-prices and re-checks stock at checkout; the quantities here
//! are only clamped to what the shop reported when the line was added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::CheckoutLine;
use crate::shop::ShippingPolicy;
use crate::{ProductId, VariantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("This item is out of stock")]
    OutOfStock,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("That item is no longer in your cart")]
    LineNotFound,
}

/// One product (or variant) in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub variant_label: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Stock reported when the line was last added.
    pub max_quantity: u32,
    pub image_url: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn is(&self, product: ProductId, variant: Option<VariantId>) -> bool {
        self.product_id == product && self.variant_id == variant
    }
}

/// Subtotal, shipping and total of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units across all lines (the header badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add a line, merging with an existing line for the same product and
    /// variant. Returns the line's resulting quantity.
    ///
    /// # Errors
    ///
    /// [`CartError::OutOfStock`] when no stock is available and
    /// [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn add(&mut self, line: CartLine) -> Result<u32, CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if line.max_quantity == 0 {
            return Err(CartError::OutOfStock);
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.is(line.product_id, line.variant_id))
        {
            existing.max_quantity = line.max_quantity;
            existing.unit_price = line.unit_price;
            existing.quantity = existing
                .quantity
                .saturating_add(line.quantity)
                .min(line.max_quantity);
            return Ok(existing.quantity);
        }

        let quantity = line.quantity.min(line.max_quantity);
        self.lines.push(CartLine { quantity, ..line });
        Ok(quantity)
    }

    /// Change a line's quantity; zero removes it. Returns the quantity kept.
    ///
    /// # Errors
    ///
    /// [`CartError::LineNotFound`] when the line is not in the cart.
    pub fn set_quantity(
        &mut self,
        product: ProductId,
        variant: Option<VariantId>,
        quantity: u32,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return if self.remove(product, variant) {
                Ok(0)
            } else {
                Err(CartError::LineNotFound)
            };
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.is(product, variant))
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity.min(line.max_quantity.max(1));
        Ok(line.quantity)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product: ProductId, variant: Option<VariantId>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.is(product, variant));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn totals(&self, shipping: &ShippingPolicy) -> CartTotals {
        let subtotal = self.subtotal();
        let shipping = shipping.fee_for(subtotal);
        CartTotals {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Lines as sent with a checkout request.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.lines
            .iter()
            .map(|l| CheckoutLine {
                product_id: l.product_id,
                variant_id: l.variant_id,
                quantity: l.quantity,
            })
            .collect()
    }
}
