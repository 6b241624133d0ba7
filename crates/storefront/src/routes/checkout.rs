//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use petal_core::Price;
use tower_sessions::Session;
use tracing::instrument;

use crate::checkout::{CheckoutFlow, CheckoutForm, CheckoutOutcome};
use crate::error::add_breadcrumb;
use crate::routes::cart::{CartView, load_cart};
use crate::state::AppState;

/// Countries offered in the checkout form.
pub const COUNTRIES: &[(&str, &str)] = &[
    ("NG", "Nigeria"),
    ("GH", "Ghana"),
    ("KE", "Kenya"),
    ("ZA", "South Africa"),
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("FR", "France"),
    ("DE", "Germany"),
];

/// Country option for the form select.
#[derive(Clone)]
pub struct CountryOption {
    pub code: &'static str,
    pub name: &'static str,
    pub selected: bool,
}

fn country_options(selected: &str) -> Vec<CountryOption> {
    let selected = selected.trim();
    COUNTRIES
        .iter()
        .map(|&(code, name)| CountryOption {
            code,
            name,
            selected: code.eq_ignore_ascii_case(selected),
        })
        .collect()
}

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutForm,
    pub countries: Vec<CountryOption>,
    pub error: Option<String>,
}

/// Inline payment confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub name: String,
    pub email: String,
    pub total: String,
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let cart = load_cart(session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let checkout = &state.config().checkout;
    let form = CheckoutForm::with_country(&checkout.default_country);
    CheckoutTemplate {
        cart: CartView::new(&cart, checkout),
        countries: country_options(&form.country),
        form,
        error: None,
    }
    .into_response()
}

/// Submit the order.
///
/// - redirect confirmation: 303 to the hosted payment page
/// - inline confirmation: render the confirmation page
/// - validation problem or failure: re-render the form with the message
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let mut cart = load_cart(session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let checkout = &state.config().checkout;
    let mut flow = CheckoutFlow::with_form(checkout, form);

    if let Err(e) = flow.form().validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutTemplate {
                cart: CartView::new(&cart, checkout),
                countries: country_options(&flow.form().country),
                form: flow.form().clone(),
                error: Some(capitalize(&e.to_string())),
            },
        )
            .into_response();
    }

    let total = Price::new(flow.grand_total(&cart), flow.currency()).display();

    match flow.submit(&mut cart, state.backend()).await {
        CheckoutOutcome::SucceededRedirect(url) => {
            add_breadcrumb("checkout", "Redirected to payment page", None);
            Redirect::to(url.as_str()).into_response()
        }
        CheckoutOutcome::SucceededInline => {
            add_breadcrumb("checkout", "Order confirmed inline", None);
            ConfirmationTemplate {
                name: flow.form().name.trim().to_string(),
                email: flow.form().email.trim().to_string(),
                total,
            }
            .into_response()
        }
        CheckoutOutcome::Failed(message) => CheckoutTemplate {
            cart: CartView::new(&cart, checkout),
            countries: country_options(&flow.form().country),
            form: flow.form().clone(),
            error: Some(message),
        }
        .into_response(),
        CheckoutOutcome::Pending => Redirect::to("/checkout").into_response(),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_options_mark_selection() {
        let options = country_options("gh");
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code, "GH");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("zip is required"), "Zip is required");
        assert_eq!(capitalize(""), "");
    }
}
