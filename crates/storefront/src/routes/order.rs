//! Order completion route.
//!
//! Hosted payment pages send the shopper back to
//! `/order/success?status=success&session=<reference>`; any other status means
//! the payment failed or was canceled.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Query;
use axum::response::IntoResponse;
use petal_core::{PaymentReference, PaymentStatus};
use serde::Deserialize;
use tracing::instrument;

/// Query parameters appended by the payment provider.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionQuery {
    pub status: Option<String>,
    pub session: Option<String>,
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/status.html")]
pub struct OrderStatusTemplate {
    pub success: bool,
    pub reference: Option<String>,
}

/// Show the payment result.
#[instrument]
pub async fn success(Query(query): Query<CompletionQuery>) -> impl IntoResponse {
    let status = PaymentStatus::from_query(query.status.as_deref());
    let reference = query
        .session
        .map(PaymentReference::from)
        .filter(|r| !r.is_blank());

    tracing::info!(%status, has_reference = reference.is_some(), "Shopper returned from payment");

    OrderStatusTemplate {
        success: status.is_success(),
        reference: reference.map(PaymentReference::into_inner),
    }
}
