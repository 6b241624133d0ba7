//! Cart notifications.
//!
//! Every cart mutation emits a [`CartEvent`] on a broadcast channel. The web
//! layer turns them into toast triggers; the CLI prints them.

use petal_core::ProductId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Severity of a notification, mapped to toast styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
}

/// Something that happened to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line was appended.
    Added { name: String },
    /// An existing line's quantity went up by one.
    Increased { name: String },
    /// A line was removed (or was already absent).
    Removed { id: ProductId },
    /// A line's quantity was set.
    QuantityUpdated { id: ProductId, quantity: u32 },
    /// The cart was emptied.
    Cleared,
}

impl CartEvent {
    /// Message shown to the shopper.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Added { name } => format!("{name} added to cart!"),
            Self::Increased { name } => format!("{name} quantity increased!"),
            Self::Removed { .. } => "Item removed from cart.".to_string(),
            Self::QuantityUpdated { quantity, .. } => format!("Quantity updated to {quantity}."),
            Self::Cleared => "Cart cleared.".to_string(),
        }
    }

    #[must_use]
    pub const fn level(&self) -> NotificationLevel {
        match self {
            Self::Added { .. } | Self::Increased { .. } => NotificationLevel::Success,
            Self::QuantityUpdated { .. } | Self::Cleared => NotificationLevel::Info,
            Self::Removed { .. } => NotificationLevel::Warning,
        }
    }
}

/// A notification as sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub level: NotificationLevel,
}

impl From<&CartEvent> for Toast {
    fn from(event: &CartEvent) -> Self {
        Self {
            message: event.message(),
            level: event.level(),
        }
    }
}

/// Collect every event currently queued on `receiver` without waiting.
///
/// Lagged receivers skip what they missed and keep going.
pub fn drain(receiver: &mut broadcast::Receiver<CartEvent>) -> Vec<CartEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Cart notification receiver lagged");
            }
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                break;
            }
        }
    }
    events
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let added = CartEvent::Added {
            name: "Halo Ring".to_string(),
        };
        assert_eq!(added.message(), "Halo Ring added to cart!");
        assert_eq!(added.level(), NotificationLevel::Success);

        let increased = CartEvent::Increased {
            name: "Halo Ring".to_string(),
        };
        assert_eq!(increased.message(), "Halo Ring quantity increased!");

        let removed = CartEvent::Removed {
            id: ProductId::new("ring-1"),
        };
        assert_eq!(removed.message(), "Item removed from cart.");
        assert_eq!(removed.level(), NotificationLevel::Warning);
    }

    #[test]
    fn test_drain_collects_in_order() {
        let (sender, mut receiver) = broadcast::channel(8);
        sender.send(CartEvent::Cleared).unwrap();
        sender
            .send(CartEvent::Added {
                name: "x".to_string(),
            })
            .unwrap();

        let events = drain(&mut receiver);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CartEvent::Cleared);
        assert!(drain(&mut receiver).is_empty());
    }
}
