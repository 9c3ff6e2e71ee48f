//! Session-backed models for the storefront.
//!
//! Shopify owns all commerce data; the only local state is what lives in the
//! visitor's session.

pub mod session;

pub use session::{CompareList, keys as session_keys};
