//! REST client for the Bazaar commerce backend.
//!
//! The backend is the source of truth for every shop, product, order and
//! ticket. This crate only moves data: no local sync, direct API calls, with
//! public catalog reads cached in memory via `moka` (5 minute TTL).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use bazaar_backend::BackendClient;
//! use bazaar_core::{ShopId, catalog::ProductQuery};
//!
//! let client = BackendClient::new("https://api.example.com", Duration::from_secs(10))?;
//! let page = client.products(ShopId::new(1), &ProductQuery::default()).await?;
//! ```

mod analytics;
mod auth;
mod cache;
mod catalog;
mod categories;
mod client;
mod error;
mod merchant;
mod orders;
mod reviews;
mod superadmin;
mod support;
pub mod types;

#[cfg(test)]
mod testing;

pub use categories::CategoryScope;
pub use client::BackendClient;
pub use error::ApiError;
pub use reviews::EligibilityError;
pub use types::*;
