//! Bazaar Core - Shared domain types and storefront decision logic.
//!
//! This crate provides the types used across all Bazaar components:
//! - `backend` - REST client for the commerce backend
//! - `storefront` - Public multi-tenant shop
//! - `admin` - Merchant dashboard and superadmin back office
//! - `cli` - Command-line tools for migrations and shop config checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The commerce backend owns every record; the logic
//! here decides what to show and what to send, never what is true.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, roles and secret checks
//! - [`catalog`] - Products, variants, categories, brands, filters, price slider
//! - [`variant`] - Matching an attribute selection to a product variant
//! - [`pagination`] - Page arithmetic for listing controls
//! - [`order`] - Orders, status badges and status transitions
//! - [`review`] - Reviews, drafts and the purchase eligibility scan
//! - [`support`] - Support tickets and message validation
//! - [`cart`] - Session cart lines and totals
//! - [`shop`] - Tenant definitions and host resolution
//! - [`settings`] - Merchant shop settings
//! - [`account`] - Back-office admin accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod pagination;
pub mod review;
pub mod settings;
pub mod shop;
pub mod support;
pub mod types;
pub mod variant;

pub use types::*;
