//! Cart route handlers.
//!
//! The cart lives in the shopper's session. Each handler restores a
//! [`CartStore`] from the session slot, applies one mutation and lets the store
//! persist it. HTMX requests get a fragment plus an `HX-Trigger` header
//! carrying the toast; plain form posts are redirected back to `/cart`.

use std::fmt::Write;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use petal_core::{CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::BackendError;
use crate::cart::{CartEvent, CartStorage, CartStore, NewCartItem, SessionCartStorage, Toast};
use crate::cart::events::drain;
use crate::config::CheckoutConfig;
use crate::error::{AppError, add_breadcrumb};
use crate::routes::is_htmx;
use crate::state::AppState;

/// Event name listened for by the cart badge and cart page.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub grand_total: String,
}

impl CartView {
    /// Build the view for `cart`, adding the configured flat shipping.
    pub fn new<S: CartStorage>(cart: &CartStore<S>, checkout: &CheckoutConfig) -> Self {
        let money = |amount: Decimal| Price::new(amount, checkout.currency).display();
        let subtotal = cart.total();

        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    id: line.id.to_string(),
                    name: line.name.clone(),
                    image: line.image.clone(),
                    quantity: line.quantity,
                    price: money(line.price),
                    line_price: money(line.line_total()),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: money(subtotal),
            shipping: money(checkout.shipping_cost),
            grand_total: money(subtotal + checkout.shipping_cost),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Restore the shopper's cart from the session.
pub async fn load_cart(session: Session) -> CartStore<SessionCartStorage> {
    CartStore::load(SessionCartStorage::new(session)).await
}

/// `HX-Trigger` header value: the update event plus the latest toast.
fn trigger_header(events: &[CartEvent]) -> HeaderValue {
    let mut trigger = serde_json::Map::new();
    trigger.insert(CART_UPDATED_EVENT.to_string(), serde_json::Value::Null);
    if let Some(event) = events.last()
        && let Ok(toast) = serde_json::to_value(Toast::from(event))
    {
        trigger.insert("toast".to_string(), toast);
    }

    HeaderValue::from_str(&ascii_json(&serde_json::Value::Object(trigger)))
        .unwrap_or_else(|_| HeaderValue::from_static(CART_UPDATED_EVENT))
}

/// Serialize `value` as JSON with every non-ASCII character `\u`-escaped so it
/// is safe in a header.
fn ascii_json(value: &serde_json::Value) -> String {
    let json = value.to_string();
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

/// Respond to a cart mutation: fragment for HTMX, redirect otherwise.
fn mutation_response(
    headers: &HeaderMap,
    mut events: broadcast::Receiver<CartEvent>,
    fragment: impl IntoResponse,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    let events = drain(&mut events);
    ([("HX-Trigger", trigger_header(&events))], fragment).into_response()
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data. Quantities below 1 are clamped to 1.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = load_cart(session).await;
    CartShowTemplate {
        cart: CartView::new(&cart, &state.config().checkout),
    }
}

/// Add one unit of a product.
///
/// The product is looked up in the catalog so name, price and image come from
/// the API rather than the form.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(form.product_id.trim());
    if id.is_blank() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }

    let product = state.backend().get_product(&id).await.map_err(|e| match e {
        BackendError::NotFound(_) => AppError::NotFound(format!("Product {id}")),
        other => AppError::Backend(other),
    })?;

    let mut cart = load_cart(session).await;
    let events = cart.subscribe();
    cart.add_item(NewCartItem::from(&product)).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));

    let count = cart.item_count();
    Ok(mutation_response(&headers, events, CartCountTemplate { count }))
}

/// Set a line's quantity.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let mut cart = load_cart(session).await;
    let events = cart.subscribe();
    cart.set_quantity(&ProductId::new(form.product_id), form.quantity)
        .await?;

    let view = CartView::new(&cart, &state.config().checkout);
    Ok(mutation_response(&headers, events, CartItemsTemplate { cart: view }))
}

/// Remove a line.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(form.product_id);
    let mut cart = load_cart(session).await;
    let events = cart.subscribe();
    cart.remove_item(&id).await?;

    add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));

    let view = CartView::new(&cart, &state.config().checkout);
    Ok(mutation_response(&headers, events, CartItemsTemplate { cart: view }))
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mut cart = load_cart(session).await;
    let events = cart.subscribe();
    cart.clear().await?;

    let view = CartView::new(&cart, &state.config().checkout);
    Ok(mutation_response(&headers, events, CartItemsTemplate { cart: view }))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let cart = load_cart(session).await;
    CartCountTemplate {
        count: cart.item_count(),
    }
}
