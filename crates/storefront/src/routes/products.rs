//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use petal_core::{CurrencyCode, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{BackendError, Product};
use crate::routes::ErrorTemplate;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub material: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
    pub image: String,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price_in(currency).display(),
            material: product.material.clone(),
            description: product.description.clone(),
            details: product.details.clone(),
            image: product.image.to_string(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub limit: Option<u32>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub total_count: u64,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Message for a failed catalog read.
///
/// Only a missing configuration gets a specific explanation; anything else is
/// reported as a generic load failure.
pub fn catalog_error_message(err: &BackendError) -> String {
    match err {
        BackendError::NotConfigured => err.user_message(),
        _ => "Failed to load products. Please try again later.".to_string(),
    }
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> impl IntoResponse {
    let currency = state.config().checkout.currency;

    match state.backend().list_products(query.limit).await {
        Ok(page) => ProductsIndexTemplate {
            products: page
                .products
                .iter()
                .map(|p| ProductView::new(p, currency))
                .collect(),
            total_count: page.total_count,
            message: page.message,
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            ProductsIndexTemplate {
                products: Vec::new(),
                total_count: 0,
                message: None,
                error: Some(catalog_error_message(&e)),
            }
        }
    }
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = ProductId::new(id);
    if id.is_blank() {
        return (
            StatusCode::NOT_FOUND,
            ErrorTemplate::new("Product not found", "No product ID provided."),
        )
            .into_response();
    }

    match state.backend().get_product(&id).await {
        Ok(product) => ProductShowTemplate {
            product: ProductView::new(&product, state.config().checkout.currency),
        }
        .into_response(),
        Err(BackendError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            ErrorTemplate::new("Product not found", "That product could not be found."),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch product");
            let message = match e {
                BackendError::NotConfigured => e.user_message(),
                _ => "Failed to load product details or data is corrupt.".to_string(),
            };
            (
                StatusCode::BAD_GATEWAY,
                ErrorTemplate::new("Something went wrong", message),
            )
                .into_response()
        }
    }
}
