//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod secret;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use secret::{SecretStrengthError, shannon_entropy, validate_secret_strength};
pub use status::*;
