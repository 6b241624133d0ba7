//! Petal Core - Shared types library.
//!
//! This crate provides common types used across all Petal components:
//! - `storefront` - Public-facing shop (products, cart, checkout)
//! - `cli` - Command-line tools for migrations and a terminal cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, emails, country codes
//!   and payment statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
