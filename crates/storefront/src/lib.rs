//! Petal storefront library.
//!
//! Catalog browsing, a session-backed cart and checkout against the shop's
//! product and payment API. Exposed as a library so the binary, the CLI and
//! the integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
