//! Core types for Canopy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod gid;
pub mod handle;
pub mod price;

pub use gid::{GidError, ShopifyGid};
pub use handle::{Handle, HandleError};
pub use price::{CurrencyCode, Price, PriceError};
