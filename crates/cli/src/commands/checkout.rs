//! Terminal checkout.

use std::path::Path;

use petal_storefront::checkout::{CheckoutFlow, CheckoutForm, CheckoutOutcome};
use petal_storefront::config::CheckoutConfig;

use super::cart::print_cart;
use super::{CommandResult, backend_client, money, open_cart};

/// Submit the file cart as an order.
///
/// Prints the payment page URL when the API asks for a redirect. The cart is
/// emptied once the order is accepted.
///
/// # Errors
///
/// Returns an error if the cart is empty, the details are invalid or the API
/// declines the order.
#[allow(clippy::print_stdout)]
pub async fn submit(data_dir: &Path, mut form: CheckoutForm) -> CommandResult {
    let checkout = CheckoutConfig::from_env()?;
    let backend = backend_client()?;
    let mut cart = open_cart(data_dir).await;

    if cart.is_empty() {
        return Err("Your cart is empty.".into());
    }
    if form.country.trim().is_empty() {
        form.country = checkout.default_country.to_string();
    }

    let mut flow = CheckoutFlow::with_form(&checkout, form);
    // Surface the validation problem; `submit` would silently refuse.
    flow.build_request(&cart)?;

    print_cart(&cart, &checkout);
    let total = money(flow.grand_total(&cart), &checkout);

    match flow.submit(&mut cart, &backend).await {
        CheckoutOutcome::SucceededInline => {
            println!("Payment successful. {total} charged.");
            Ok(())
        }
        CheckoutOutcome::SucceededRedirect(url) => {
            println!("Order placed. Complete payment of {total} at:\n{url}");
            Ok(())
        }
        CheckoutOutcome::Failed(message) => Err(message.into()),
        CheckoutOutcome::Pending => Err("Checkout could not be submitted.".into()),
    }
}
