//! Session-held models.

pub mod session;

pub use session::{CurrentCustomer, VisitState, keys as session_keys};
