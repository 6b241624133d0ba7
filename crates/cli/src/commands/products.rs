//! Catalog commands.

use petal_core::ProductId;
use petal_storefront::config::CheckoutConfig;

use super::{CommandResult, backend_client};

/// Print the catalog, optionally limited to the first `limit` products.
///
/// # Errors
///
/// Returns an error if the storefront API is not configured or the request fails.
#[allow(clippy::print_stdout)]
pub async fn list(limit: Option<u32>) -> CommandResult {
    let checkout = CheckoutConfig::from_env()?;
    let page = backend_client()?.list_products(limit).await?;

    if let Some(message) = &page.message {
        println!("{message}");
    }
    if page.products.is_empty() {
        println!("No products.");
        return Ok(());
    }

    for product in &page.products {
        println!(
            "{:<20} {:<32} {:>12}",
            product.id,
            product.name,
            product.price_in(checkout.currency).display()
        );
    }
    println!(
        "Showing {} of {} products",
        page.products.len(),
        page.total_count
    );
    Ok(())
}

/// Print one product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the request fails.
#[allow(clippy::print_stdout)]
pub async fn show(id: &str) -> CommandResult {
    let checkout = CheckoutConfig::from_env()?;
    let product = backend_client()?.get_product(&ProductId::new(id)).await?;

    println!("{} ({})", product.name, product.id);
    println!("Price:    {}", product.price_in(checkout.currency).display());
    if let Some(material) = &product.material {
        println!("Material: {material}");
    }
    if let Some(description) = &product.description {
        println!("\n{description}");
    }
    if let Some(details) = &product.details {
        println!("\n{details}");
    }
    println!("Image:    {}", product.image);
    Ok(())
}
