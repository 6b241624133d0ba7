//! Storefront API client (products and order/payment endpoints).
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; the remote API is the source of truth
//! - Responses are validated before they reach the rest of the app: prices must
//!   be positive, images absolute URLs, ids non-empty
//! - Product reads are cached in-memory via `moka`; payment requests never are
//!
//! # Wire contract
//!
//! - `GET <base>/products.php[?id=..|?limit=..]` returns
//!   `{ "data": ..., "totalCount": n, "message": "..." }`. A bare JSON array is
//!   accepted as a product list for older deployments.
//! - `POST <base>/payment.php` returns `{ "success": true }` for an inline
//!   confirmation, `{ "success": true, "redirect_url": "..." }` (or the older
//!   `checkout_url`) to send the shopper to a hosted payment page, or
//!   `{ "success": false, "error": "..." }`.
//!
//! # Example
//!
//! ```rust,ignore
//! use petal_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let page = client.list_products(Some(3)).await?;
//! ```

mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Shown when the payment API declines without saying why.
pub const GENERIC_PAYMENT_FAILURE: &str =
    "Payment failed. Please check your details and try again.";

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No API base URL was configured, so no request was attempted.
    #[error("API URL is not configured")]
    NotConfigured,

    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response did not have the expected shape.
    #[error("Invalid response: {0}")]
    Validation(String),

    /// The API explicitly refused the request.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// Message suitable for showing to the shopper.
    ///
    /// A rejection carries the server's own explanation verbatim; everything
    /// else gets a fixed message so internal details never leak.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured => {
                "The store is not connected to its product service yet. Please try again later."
                    .to_string()
            }
            Self::Transport(_) => {
                "We couldn't reach the store right now. Please check your connection and try again."
                    .to_string()
            }
            Self::Validation(detail) => {
                format!("The store returned an unexpected response ({detail}).")
            }
            Self::Rejected(message) => message.clone(),
            Self::NotFound(_) => "That product could not be found.".to_string(),
        }
    }
}
