//! The cart state container.

use std::collections::HashSet;

use petal_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::backend::Product;
use crate::cart::CartError;
use crate::cart::events::CartEvent;
use crate::cart::storage::CartStorage;

/// Capacity of the notification channel. Slow subscribers lag, senders never block.
const EVENT_CAPACITY: usize = 32;

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price, always greater than zero.
    pub price: Decimal,
    /// Display URI of the product image.
    pub image: String,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLineItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A product about to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl NewCartItem {
    /// Same rules `decode_lines` applies to a persisted cart.
    fn check(&self) -> Result<(), CartError> {
        if self.id.is_blank() {
            return Err(CartError::InvalidItem("empty product id".to_string()));
        }
        if self.price <= Decimal::ZERO {
            return Err(CartError::InvalidItem(format!(
                "non-positive price {} for product {}",
                self.price, self.id
            )));
        }
        Ok(())
    }
}

impl From<&Product> for NewCartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.to_string(),
        }
    }
}

/// Ordered cart lines backed by a durable slot.
///
/// Every mutation takes `&mut self`, writes the full line sequence to the
/// storage slot and emits a [`CartEvent`]. Lines keep insertion order and there
/// is at most one line per product id.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    lines: Vec<CartLineItem>,
    events: broadcast::Sender<CartEvent>,
}

impl<S: CartStorage> CartStore<S> {
    /// Restore the cart from `storage`.
    ///
    /// Anything unusable in the slot (read failure, invalid JSON, duplicate
    /// ids, zero quantities, non-positive prices) yields an empty cart.
    #[instrument(skip(storage))]
    pub async fn load(storage: S) -> Self {
        let lines = match storage.load().await {
            Ok(Some(payload)) => decode_lines(&payload).unwrap_or_else(|reason| {
                tracing::warn!(%reason, "Discarding unreadable persisted cart");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted cart, starting empty");
                Vec::new()
            }
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            lines,
            events,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Σ price × quantity, recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }

    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Receiver for notifications emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] for a blank id or a price that is
    /// not positive; the cart is left untouched. Returns an error if the cart
    /// cannot be persisted. The in-memory cart keeps the change.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub async fn add_item(&mut self, item: NewCartItem) -> Result<(), CartError> {
        item.check()?;

        let event = if let Some(line) = self.lines.iter_mut().find(|line| line.id == item.id) {
            line.quantity = line.quantity.saturating_add(1);
            CartEvent::Increased { name: line.name.clone() }
        } else {
            let name = item.name.clone();
            self.lines.push(CartLineItem {
                id: item.id,
                name: item.name,
                price: item.price,
                image: item.image,
                quantity: 1,
            });
            CartEvent::Added { name }
        };

        self.commit(event).await
    }

    /// Remove a product's line. Removing an absent product is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_item(&mut self, id: &ProductId) -> Result<(), CartError> {
        self.lines.retain(|line| &line.id != id);
        self.commit(CartEvent::Removed { id: id.clone() }).await
    }

    /// Set a line's quantity, clamped to at least 1. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> Result<(), CartError> {
        let effective = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);

        let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) else {
            tracing::debug!("Quantity update for product not in cart");
            return Ok(());
        };
        line.quantity = effective;

        self.commit(CartEvent::QuantityUpdated {
            id: id.clone(),
            quantity: effective,
        })
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.commit(CartEvent::Cleared).await
    }

    /// Write the current line sequence to storage without notifying anyone.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub async fn persist(&self) -> Result<(), CartError> {
        let payload = serde_json::to_string(&self.lines)?;
        self.storage.save(payload).await?;
        Ok(())
    }

    /// Notify subscribers, then write the full line sequence to storage.
    async fn commit(&mut self, event: CartEvent) -> Result<(), CartError> {
        // No subscribers is fine
        let _ = self.events.send(event);
        self.persist().await
    }
}

/// Decode and check a persisted line sequence.
fn decode_lines(payload: &str) -> Result<Vec<CartLineItem>, String> {
    let lines: Vec<CartLineItem> = serde_json::from_str(payload).map_err(|e| e.to_string())?;

    let mut seen = HashSet::with_capacity(lines.len());
    for line in &lines {
        if line.id.is_blank() {
            return Err("line with empty product id".to_string());
        }
        if !seen.insert(&line.id) {
            return Err(format!("duplicate line for product {}", line.id));
        }
        if line.quantity == 0 {
            return Err(format!("zero quantity for product {}", line.id));
        }
        if line.price <= Decimal::ZERO {
            return Err(format!("non-positive price for product {}", line.id));
        }
    }
    Ok(lines)
}
