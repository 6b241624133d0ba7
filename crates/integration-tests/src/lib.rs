//! Integration test support for Petal.
//!
//! Spawns an in-process fake of the storefront API (`products.php` and
//! `payment.php`) on a random local port so the client, the checkout flow and
//! the web routes can be exercised end to end without network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p petal-integration-tests
//! ```

use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// How the fake payment endpoint answers.
#[derive(Debug, Clone)]
pub enum PaymentBehavior {
    /// `{"success": true}`
    Inline,
    /// `{"success": true, "redirect_url": ...}`
    Redirect(String),
    /// `{"success": false, "error": ...}` with a 402
    Decline(String),
    /// 500 with an HTML body
    ServerError,
}

/// Handle to a running fake storefront API.
pub struct FakeStorefrontApi {
    /// Base URL to configure the client with.
    pub base_url: Url,
    orders: Arc<Mutex<Vec<Value>>>,
}

impl FakeStorefrontApi {
    /// Start the fake API with the given payment behavior.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(payment: PaymentBehavior) -> Self {
        let orders = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            payment,
            orders: Arc::clone(&orders),
        };

        let app = Router::new()
            .route("/api/products.php", get(products))
            .route("/api/payment.php", post(payment_endpoint))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener
            .local_addr()
            .expect("Fake API listener has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/api/")).expect("valid fake API URL"),
            orders,
        }
    }

    /// Order bodies received by the payment endpoint, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.orders.lock().expect("orders lock poisoned").clone()
    }
}

#[derive(Clone)]
struct FakeState {
    payment: PaymentBehavior,
    orders: Arc<Mutex<Vec<Value>>>,
}

/// Catalog served by the fake API.
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "ring-1",
            "name": "Halo Ring",
            "price": 120.5,
            "material": "Sterling silver",
            "description": "A thin band with a single stone.",
            "image": "https://cdn.petal.shop/ring-1.jpg",
        }),
        json!({
            "id": "earring-2",
            "name": "Drop Earrings",
            "price": 45,
            "material": "Gold vermeil",
            "image": "https://cdn.petal.shop/earring-2.jpg",
        }),
        json!({
            "id": "necklace-3",
            "name": "Pearl Necklace",
            "price": 80,
            "details": "Freshwater pearls, 45cm chain.",
            "image": "https://cdn.petal.shop/necklace-3.jpg",
        }),
    ]
}

#[derive(Deserialize)]
struct ProductsQuery {
    id: Option<String>,
    limit: Option<usize>,
}

async fn products(Query(query): Query<ProductsQuery>) -> (StatusCode, Json<Value>) {
    let all = catalog();

    if let Some(id) = query.id {
        return all
            .into_iter()
            .find(|product| product["id"] == id.as_str())
            .map_or_else(
                || (StatusCode::NOT_FOUND, Json(json!({ "data": null }))),
                |product| (StatusCode::OK, Json(json!({ "data": product }))),
            );
    }

    let total = all.len();
    let data: Vec<Value> = all
        .into_iter()
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();
    (
        StatusCode::OK,
        Json(json!({ "data": data, "totalCount": total })),
    )
}

async fn payment_endpoint(
    State(state): State<FakeState>,
    Json(order): Json<Value>,
) -> (StatusCode, String) {
    if let Ok(mut orders) = state.orders.lock() {
        orders.push(order);
    }

    match state.payment {
        PaymentBehavior::Inline => (StatusCode::OK, json!({ "success": true }).to_string()),
        PaymentBehavior::Redirect(url) => (
            StatusCode::OK,
            json!({ "success": true, "redirect_url": url }).to_string(),
        ),
        PaymentBehavior::Decline(error) => (
            StatusCode::PAYMENT_REQUIRED,
            json!({ "success": false, "error": error }).to_string(),
        ),
        PaymentBehavior::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>Fatal error</body></html>".to_string(),
        ),
    }
}
