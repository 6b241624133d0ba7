//! Shopping cart.
//!
//! [`CartStore`] owns the line items and is the only way to change them. It is
//! generic over a [`CartStorage`] slot so the same logic backs the web session
//! cart, the CLI's file cart and test carts.

pub mod events;
pub mod storage;
mod store;

pub use events::{CartEvent, NotificationLevel, Toast};
pub use storage::{
    CART_STORAGE_KEY, CartStorage, FileCartStorage, MemoryCartStorage, SessionCartStorage,
    StorageError,
};
pub use store::{CartLineItem, CartStore, NewCartItem};

use thiserror::Error;

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("invalid cart item: {0}")]
    InvalidItem(String),
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}
