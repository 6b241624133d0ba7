//! Storefront API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP. Product reads are cached using `moka`
//! (TTL from [`BackendConfig::cache_ttl`]).

mod cache;
mod conversions;

use std::sync::Arc;

use moka::future::Cache;
use petal_core::ProductId;
use reqwest::StatusCode;
use tracing::{debug, instrument};
use url::Url;

use crate::backend::BackendError;
use crate::backend::types::{CheckoutRequest, PaymentConfirmation, Product, ProductPage};
use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};
use conversions::{parse_payment_response, parse_product_detail, parse_product_page};

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the storefront API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Option<Url>,
    products_path: String,
    payment_path: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new storefront API client.
    ///
    /// An unconfigured base URL is accepted; every call then fails with
    /// [`BackendError::NotConfigured`] without touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
                products_path: config.products_path.clone(),
                payment_path: config.payment_path.clone(),
                cache,
            }),
        })
    }

    /// Whether an API base URL is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.base_url.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let base = self
            .inner
            .base_url
            .as_ref()
            .ok_or(BackendError::NotConfigured)?;
        base.join(path.trim_start_matches('/')).map_err(|e| {
            tracing::error!(error = %e, path, "Invalid storefront API endpoint path");
            BackendError::NotConfigured
        })
    }

    /// Send a GET and return the status with the body text.
    async fn get(&self, url: Url) -> Result<(StatusCode, String), BackendError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        // Get response body as text first for better error diagnostics
        let body = response.text().await?;
        Ok((status, body))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a page of products, optionally limited to the first `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is not configured, unreachable, answers with
    /// a non-success status or sends a malformed payload.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: Option<u32>) -> Result<ProductPage, BackendError> {
        let cache_key = CacheKey::Products { limit };

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let mut url = self.endpoint(&self.inner.products_path)?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }

        let (status, body) = self.get(url).await?;
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(&body),
                "Products endpoint returned non-success status"
            );
            return Err(BackendError::Rejected(format!(
                "The product service is unavailable right now (HTTP {}).",
                status.as_u16()
            )));
        }

        let page = parse_product_page(&body).inspect_err(|e| {
            tracing::error!(error = %e, body = %snippet(&body), "Failed to validate products response");
        })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for a 404 or an empty `data` field,
    /// otherwise the same errors as [`Self::list_products`].
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let mut url = self.endpoint(&self.inner.products_path)?;
        url.query_pairs_mut().append_pair("id", id.as_str());

        let (status, body) = self.get(url).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(format!("Product not found: {id}")));
        }
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %snippet(&body),
                "Product endpoint returned non-success status"
            );
            return Err(BackendError::Rejected(format!(
                "The product service is unavailable right now (HTTP {}).",
                status.as_u16()
            )));
        }

        let product = parse_product_detail(&body, id)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit an order to the payment endpoint. Never cached, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] when the API declines the order,
    /// [`BackendError::Validation`] for a malformed answer and
    /// [`BackendError::Transport`] when the request does not complete.
    #[instrument(skip(self, request), fields(lines = request.order_details.len(), total = %request.total_amount))]
    pub async fn create_order(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PaymentConfirmation, BackendError> {
        let url = self.endpoint(&self.inner.payment_path)?;

        let response = self.inner.client.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let outcome = parse_payment_response(status, &body);
        match &outcome {
            Ok(PaymentConfirmation::Redirect(target)) => {
                tracing::info!(host = target.host_str().unwrap_or(""), "Order accepted, redirecting to payment page");
            }
            Ok(PaymentConfirmation::Inline) => tracing::info!("Order accepted inline"),
            Err(e) => {
                tracing::warn!(status = %status, error = %e, body = %snippet(&body), "Order not accepted");
            }
        }
        outcome
    }
}

/// First 500 characters of a response body for logs.
fn snippet(body: &str) -> String {
    body.chars().take(500).collect()
}
