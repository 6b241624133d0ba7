//! Domain types for the storefront API.
//!
//! These are the validated forms of what the API sends and receives. The raw
//! wire shapes live next to the client and never escape it.

use petal_core::{CountryCode, CurrencyCode, Email, Price, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;

// =============================================================================
// Catalog Types
// =============================================================================

/// A catalog product that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Non-empty product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price, always greater than zero.
    pub price: Decimal,
    /// Material, e.g. "18k gold vermeil".
    pub material: Option<String>,
    /// Short description for listings.
    pub description: Option<String>,
    /// Long-form details for the product page.
    pub details: Option<String>,
    /// Absolute image URL.
    pub image: Url,
}

impl Product {
    /// Unit price in the given currency.
    #[must_use]
    pub const fn price_in(&self, currency_code: CurrencyCode) -> Price {
        Price::new(self.price, currency_code)
    }
}

/// One page of products from the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    /// Products in API order.
    pub products: Vec<Product>,
    /// Total number of products the API knows about.
    pub total_count: u64,
    /// Informational message from the API, if any.
    pub message: Option<String>,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// One line of the order snapshot sent at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub name: String,
}

/// Body of the order/payment request.
///
/// Customer fields are already trimmed and validated; `total_amount` includes
/// shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: CountryCode,
    pub order_details: Vec<OrderLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
}

/// Successful answer from the payment endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentConfirmation {
    /// Payment confirmed in the response itself.
    Inline,
    /// Shopper must continue on a hosted payment page.
    Redirect(Url),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_wire_format() {
        let request = CheckoutRequest {
            name: "Ada Obi".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            address: "1 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            zip: "100001".to_string(),
            country: CountryCode::parse("ng").unwrap(),
            order_details: vec![OrderLine {
                id: ProductId::new("ring-1"),
                quantity: 2,
                price: Decimal::new(1250, 2),
                name: "Halo Ring".to_string(),
            }],
            total_amount: Decimal::new(4000, 2),
            currency: CurrencyCode::USD,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["country"], "NG");
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["total_amount"], 40.0);
        assert_eq!(json["order_details"][0]["id"], "ring-1");
        assert_eq!(json["order_details"][0]["price"], 12.5);
        assert_eq!(json["order_details"][0]["quantity"], 2);
    }
}
