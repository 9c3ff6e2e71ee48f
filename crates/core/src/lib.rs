//! Canopy Core - Shared types library.
//!
//! Types used by the storefront that carry no I/O: prices parsed from the
//! Storefront API's decimal strings, URL handles, and Shopify global IDs.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for prices, handles, and global IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
