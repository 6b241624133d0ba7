//! Terminal cart commands.
//!
//! The cart is kept in `<data-dir>/cart.json` and survives between runs.

use std::path::Path;

use petal_core::ProductId;
use petal_storefront::cart::{CartEvent, CartStorage, CartStore, NewCartItem};
use petal_storefront::cart::events::drain;
use petal_storefront::config::CheckoutConfig;

use super::{CommandResult, backend_client, money, open_cart};

/// Print the cart with totals.
///
/// # Errors
///
/// Returns an error if the checkout settings in the environment are invalid.
pub async fn show(data_dir: &Path) -> CommandResult {
    let checkout = CheckoutConfig::from_env()?;
    let cart = open_cart(data_dir).await;
    print_cart(&cart, &checkout);
    Ok(())
}

/// Look the product up in the catalog and add one unit.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or the cart file cannot
/// be written.
pub async fn add(data_dir: &Path, id: &str) -> CommandResult {
    let product = backend_client()?.get_product(&ProductId::new(id)).await?;

    let mut cart = open_cart(data_dir).await;
    let mut events = cart.subscribe();
    cart.add_item(NewCartItem::from(&product)).await?;
    report(&drain(&mut events));
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart file cannot be written.
pub async fn remove(data_dir: &Path, id: &str) -> CommandResult {
    let mut cart = open_cart(data_dir).await;
    let mut events = cart.subscribe();
    cart.remove_item(&ProductId::new(id)).await?;
    report(&drain(&mut events));
    Ok(())
}

/// Set a line's quantity. Values below 1 become 1.
///
/// # Errors
///
/// Returns an error if the cart file cannot be written.
#[allow(clippy::print_stdout)]
pub async fn set(data_dir: &Path, id: &str, quantity: i64) -> CommandResult {
    let mut cart = open_cart(data_dir).await;
    let mut events = cart.subscribe();
    let id = ProductId::new(id);
    cart.set_quantity(&id, quantity).await?;

    let events = drain(&mut events);
    if events.is_empty() {
        println!("{id} is not in the cart.");
    }
    report(&events);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart file cannot be written.
pub async fn clear(data_dir: &Path) -> CommandResult {
    let mut cart = open_cart(data_dir).await;
    let mut events = cart.subscribe();
    cart.clear().await?;
    report(&drain(&mut events));
    Ok(())
}

/// Print cart lines and totals, shipping included.
#[allow(clippy::print_stdout)]
pub fn print_cart<S: CartStorage>(cart: &CartStore<S>, checkout: &CheckoutConfig) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:<20} {:<32} {:>3} x {:>10} = {:>10}",
            line.id,
            line.name,
            line.quantity,
            money(line.price, checkout),
            money(line.line_total(), checkout)
        );
    }
    println!("Subtotal ({} items): {}", cart.item_count(), money(cart.total(), checkout));
    println!("Shipping: {}", money(checkout.shipping_cost, checkout));
    println!(
        "Total: {}",
        money(cart.total() + checkout.shipping_cost, checkout)
    );
}

#[allow(clippy::print_stdout)]
fn report(events: &[CartEvent]) {
    for event in events {
        println!("{}", event.message());
    }
}
