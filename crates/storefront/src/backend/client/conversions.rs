//! Conversion from raw API payloads to validated domain types.

use std::str::FromStr;

use petal_core::ProductId;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::backend::types::{PaymentConfirmation, Product, ProductPage};
use crate::backend::{BackendError, GENERIC_PAYMENT_FAILURE};

// =============================================================================
// Raw wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: String,
    name: String,
    price: serde_json::Number,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    details: Option<String>,
    image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEnvelope {
    data: Vec<RawProduct>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    data: Option<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct RawPaymentResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    redirect_url: Option<String>,
    /// Older deployments name the redirect target `checkout_url`.
    #[serde(default)]
    checkout_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RawPaymentResponse {
    fn failure_message(self) -> Option<String> {
        non_blank(self.error).or_else(|| non_blank(self.message))
    }
}

// =============================================================================
// Products
// =============================================================================

/// Parse a product listing, accepting both the envelope and a bare array.
pub fn parse_product_page(body: &str) -> Result<ProductPage, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(invalid)?;

    let (raw, total_count, message) = if value.is_array() {
        let raw: Vec<RawProduct> = serde_json::from_value(value).map_err(invalid)?;
        (raw, None, None)
    } else {
        let envelope: ListEnvelope = serde_json::from_value(value).map_err(invalid)?;
        (envelope.data, envelope.total_count, envelope.message)
    };

    let products = raw
        .into_iter()
        .map(convert_product)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductPage {
        total_count: total_count.unwrap_or(products.len() as u64),
        products,
        message: non_blank(message),
    })
}

/// Parse a single-product response. `data: null` means the product does not exist.
pub fn parse_product_detail(body: &str, id: &ProductId) -> Result<Product, BackendError> {
    let envelope: DetailEnvelope = serde_json::from_str(body).map_err(invalid)?;
    let raw = envelope
        .data
        .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;
    convert_product(raw)
}

fn convert_product(raw: RawProduct) -> Result<Product, BackendError> {
    let id = raw.id.trim();
    if id.is_empty() {
        return Err(BackendError::Validation("product id is empty".to_string()));
    }
    let price = decimal_from_number(&raw.price).ok_or_else(|| {
        BackendError::Validation(format!("product {id} price {} is not a decimal", raw.price))
    })?;
    if price <= Decimal::ZERO {
        return Err(BackendError::Validation(format!(
            "product {id} has non-positive price {price}"
        )));
    }
    let image = Url::parse(raw.image.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| {
            BackendError::Validation(format!("product {id} image is not a URL: {}", raw.image))
        })?;

    Ok(Product {
        id: ProductId::new(id),
        name: raw.name,
        price: price.normalize(),
        material: non_blank(raw.material),
        description: non_blank(raw.description),
        details: non_blank(raw.details),
        image,
    })
}

// =============================================================================
// Payment
// =============================================================================

/// Resolve the payment endpoint's answer into a confirmation or an error.
///
/// - non-2xx: rejected, with the body's `error`/`message` when it has one
/// - 2xx with `success` absent or false: rejected the same way
/// - 2xx with `success: true`: redirect when `redirect_url`/`checkout_url`
///   is present, inline otherwise
/// - a body that is not the expected object: validation error
pub fn parse_payment_response(
    status: StatusCode,
    body: &str,
) -> Result<PaymentConfirmation, BackendError> {
    let parsed = serde_json::from_str::<RawPaymentResponse>(body);

    if !status.is_success() {
        let message = parsed.ok().and_then(RawPaymentResponse::failure_message);
        return Err(BackendError::Rejected(
            message.unwrap_or_else(|| GENERIC_PAYMENT_FAILURE.to_string()),
        ));
    }

    let raw = parsed.map_err(invalid)?;

    if raw.success != Some(true) {
        return Err(BackendError::Rejected(
            raw.failure_message()
                .unwrap_or_else(|| GENERIC_PAYMENT_FAILURE.to_string()),
        ));
    }

    match non_blank(raw.redirect_url).or_else(|| non_blank(raw.checkout_url)) {
        None => Ok(PaymentConfirmation::Inline),
        Some(target) => {
            let url = Url::parse(&target)
                .map_err(|e| BackendError::Validation(format!("redirect URL {target:?}: {e}")))?;
            // Only web pages; the URL ends up in a Location header
            if !matches!(url.scheme(), "http" | "https") {
                return Err(BackendError::Validation(format!(
                    "redirect URL {target:?}: unsupported scheme {:?}",
                    url.scheme()
                )));
            }
            Ok(PaymentConfirmation::Redirect(url))
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn invalid(err: serde_json::Error) -> BackendError {
    BackendError::Validation(err.to_string())
}

/// Exact conversion of a JSON number, without a detour through `f64`.
fn decimal_from_number(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRODUCT: &str = r#"{
        "id": "ring-1",
        "name": "Halo Ring",
        "price": 120.5,
        "material": "Sterling silver",
        "description": "A thin band",
        "details": "",
        "image": "https://cdn.petal.shop/ring-1.jpg"
    }"#;

    #[test]
    fn test_product_page_envelope() {
        let body = format!(r#"{{"data": [{PRODUCT}], "totalCount": 12, "message": "ok"}}"#);
        let page = parse_product_page(&body).unwrap();

        assert_eq!(page.total_count, 12);
        assert_eq!(page.message.as_deref(), Some("ok"));
        assert_eq!(page.products.len(), 1);

        let product = &page.products[0];
        assert_eq!(product.id.as_str(), "ring-1");
        assert_eq!(product.price, Decimal::new(1205, 1));
        assert_eq!(product.material.as_deref(), Some("Sterling silver"));
        assert_eq!(product.details, None);
    }

    #[test]
    fn test_product_page_bare_array() {
        let body = format!("[{PRODUCT}, {PRODUCT}]");
        let page = parse_product_page(&body).unwrap();
        assert_eq!(page.products.len(), 2);
        assert_eq!(page.total_count, 2);
        assert_eq!(page.message, None);
    }

    #[test]
    fn test_product_page_rejects_wrong_types() {
        let body = r#"{"data": [{"id": 7, "name": "x", "price": 1, "image": "https://a.b/c"}]}"#;
        assert!(matches!(
            parse_product_page(body),
            Err(BackendError::Validation(_))
        ));

        let body = r#"{"data": [{"id": "7", "name": "x", "price": "1.00", "image": "https://a.b/c"}]}"#;
        assert!(matches!(
            parse_product_page(body),
            Err(BackendError::Validation(_))
        ));

        assert!(matches!(
            parse_product_page(r#""products""#),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_product_validation() {
        let zero_price = r#"{"data": [{"id": "a", "name": "x", "price": 0, "image": "https://a.b/c"}]}"#;
        assert!(matches!(
            parse_product_page(zero_price),
            Err(BackendError::Validation(msg)) if msg.contains("non-positive")
        ));

        let relative_image = r#"{"data": [{"id": "a", "name": "x", "price": 3, "image": "/img.png"}]}"#;
        assert!(matches!(
            parse_product_page(relative_image),
            Err(BackendError::Validation(msg)) if msg.contains("image")
        ));

        let blank_id = r#"{"data": [{"id": "  ", "name": "x", "price": 3, "image": "https://a.b/c"}]}"#;
        assert!(matches!(
            parse_product_page(blank_id),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_product_detail() {
        let id = ProductId::new("ring-1");
        let product = parse_product_detail(&format!(r#"{{"data": {PRODUCT}}}"#), &id).unwrap();
        assert_eq!(product.name, "Halo Ring");

        assert!(matches!(
            parse_product_detail(r#"{"data": null, "message": "no such product"}"#, &id),
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn test_payment_inline_success() {
        assert_eq!(
            parse_payment_response(StatusCode::OK, r#"{"success": true}"#).unwrap(),
            PaymentConfirmation::Inline
        );
        assert_eq!(
            parse_payment_response(StatusCode::OK, r#"{"success": true, "redirect_url": ""}"#)
                .unwrap(),
            PaymentConfirmation::Inline
        );
    }

    #[test]
    fn test_payment_redirect_and_legacy_alias() {
        let expected = Url::parse("https://pay.example/abc").unwrap();
        assert_eq!(
            parse_payment_response(
                StatusCode::OK,
                r#"{"success": true, "redirect_url": "https://pay.example/abc"}"#
            )
            .unwrap(),
            PaymentConfirmation::Redirect(expected.clone())
        );
        assert_eq!(
            parse_payment_response(
                StatusCode::OK,
                r#"{"success": true, "checkout_url": "https://pay.example/abc"}"#
            )
            .unwrap(),
            PaymentConfirmation::Redirect(expected)
        );
    }

    #[test]
    fn test_payment_rejections() {
        assert!(matches!(
            parse_payment_response(StatusCode::OK, r#"{"success": false, "error": "card declined"}"#),
            Err(BackendError::Rejected(msg)) if msg == "card declined"
        ));
        assert!(matches!(
            parse_payment_response(StatusCode::OK, r#"{"message": "out of stock"}"#),
            Err(BackendError::Rejected(msg)) if msg == "out of stock"
        ));
        assert!(matches!(
            parse_payment_response(StatusCode::OK, r#"{"success": false}"#),
            Err(BackendError::Rejected(msg)) if msg == GENERIC_PAYMENT_FAILURE
        ));
        assert!(matches!(
            parse_payment_response(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            Err(BackendError::Rejected(msg)) if msg == GENERIC_PAYMENT_FAILURE
        ));
        assert!(matches!(
            parse_payment_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"success": true, "error": "zip is invalid"}"#
            ),
            Err(BackendError::Rejected(msg)) if msg == "zip is invalid"
        ));
    }

    #[test]
    fn test_payment_malformed() {
        assert!(matches!(
            parse_payment_response(StatusCode::OK, r#"{"success": "yes"}"#),
            Err(BackendError::Validation(_))
        ));
        assert!(matches!(
            parse_payment_response(StatusCode::OK, "not json"),
            Err(BackendError::Validation(_))
        ));
        assert!(matches!(
            parse_payment_response(StatusCode::OK, r#"{"success": true, "redirect_url": "pay here"}"#),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_payment_redirect_must_be_http() {
        for target in [
            "javascript:alert(1)",
            "mailto:orders@petal.shop",
            "data:text/html,hi",
            "ftp://pay.example/abc",
        ] {
            let body = format!(r#"{{"success": true, "redirect_url": "{target}"}}"#);
            assert!(
                matches!(
                    parse_payment_response(StatusCode::OK, &body),
                    Err(BackendError::Validation(_))
                ),
                "{target} should be refused"
            );
        }

        assert!(matches!(
            parse_payment_response(
                StatusCode::OK,
                r#"{"success": true, "checkout_url": "http://pay.example/abc"}"#
            ),
            Ok(PaymentConfirmation::Redirect(_))
        ));
    }
}
