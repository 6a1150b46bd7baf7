//! Session-held models.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
