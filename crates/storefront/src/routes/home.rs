//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::routes::products::ProductView;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_PRODUCT_COUNT: u32 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// First few catalog products; empty when the catalog is unavailable.
    pub featured: Vec<ProductView>,
}

/// Display the home page.
///
/// A catalog failure only hides the featured section.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let currency = state.config().checkout.currency;

    let featured = state
        .backend()
        .list_products(Some(FEATURED_PRODUCT_COUNT))
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to fetch featured products: {e}");
                Vec::new()
            },
            |page| {
                page.products
                    .iter()
                    .take(FEATURED_PRODUCT_COUNT as usize)
                    .map(|p| ProductView::new(p, currency))
                    .collect()
            },
        );

    HomeTemplate { featured }
}
