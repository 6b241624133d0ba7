//! Subcommand implementations.

pub mod cart;
pub mod checkout;
pub mod migrate;
pub mod products;

use petal_core::Price;
use petal_storefront::backend::BackendClient;
use petal_storefront::cart::{CartStore, FileCartStorage};
use petal_storefront::config::{BackendConfig, CheckoutConfig};
use rust_decimal::Decimal;

/// Boxed error used by every command.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Build a storefront API client from `STOREFRONT_API_*` variables.
pub fn backend_client() -> CommandResult<BackendClient> {
    let config = BackendConfig::from_env()?;
    Ok(BackendClient::new(&config)?)
}

/// Open the file-backed cart under `data_dir`.
pub async fn open_cart(data_dir: &std::path::Path) -> CartStore<FileCartStorage> {
    CartStore::load(FileCartStorage::in_dir(data_dir)).await
}

/// Format an amount in the configured currency.
pub fn money(amount: Decimal, checkout: &CheckoutConfig) -> String {
    Price::new(amount, checkout.currency).display()
}
