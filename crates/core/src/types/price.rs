//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        let amount = self.amount.round_dp(2);
        if amount.is_sign_negative() {
            format!("-{}{:.2}", self.currency_code.symbol(), amount.abs())
        } else {
            format!("{}{:.2}", self.currency_code.symbol(), amount)
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the shops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
    BDT,
}

impl CurrencyCode {
    /// Currency symbol used in price labels.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
            Self::BDT => "৳",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
            Self::BDT => "BDT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        let price = Price::new(Decimal::new(19_999, 3), CurrencyCode::USD);
        assert_eq!(price.display(), "$20.00");

        let price = Price::new(Decimal::new(5, 0), CurrencyCode::GBP);
        assert_eq!(price.to_string(), "£5.00");
    }

    #[test]
    fn test_display_negative() {
        let price = Price::new(Decimal::new(-250, 2), CurrencyCode::EUR);
        assert_eq!(price.display(), "-€2.50");
    }
}
