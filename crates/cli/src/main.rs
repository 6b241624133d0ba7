//! Petal CLI - migrations plus catalog, cart and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create the session tables
//! petal-cli migrate
//!
//! # Browse the catalog
//! petal-cli products list --limit 10
//! petal-cli products show ring-1
//!
//! # Build a cart (stored in .petal/cart.json)
//! petal-cli cart add ring-1
//! petal-cli cart set ring-1 3
//! petal-cli cart show
//!
//! # Place the order
//! petal-cli checkout --name "Ada Obi" --email ada@example.com \
//!     --address "1 Marina" --city Lagos --zip 100001 --country NG
//! ```
//!
//! The storefront API is configured with the same `STOREFRONT_API_*`
//! variables as the web binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use petal_storefront::checkout::CheckoutForm;

mod commands;

#[derive(Parser)]
#[command(name = "petal-cli")]
#[command(author, version, about = "Petal CLI tools")]
struct Cli {
    /// Directory holding the terminal cart
    #[arg(long, global = true, default_value = ".petal")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session tables
    Migrate,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the terminal cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        zip: String,
        /// Two-letter country code (defaults to `STOREFRONT_DEFAULT_COUNTRY`)
        #[arg(long, default_value = "")]
        country: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Only the first N products
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add one unit of a product
    Add { id: String },
    /// Remove a product
    Remove { id: String },
    /// Set a product's quantity
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petal_cli=info,petal_storefront=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> commands::CommandResult {
    let data_dir = cli.data_dir;
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Products { action } => match action {
            ProductsAction::List { limit } => commands::products::list(limit).await?,
            ProductsAction::Show { id } => commands::products::show(&id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&data_dir).await?,
            CartAction::Add { id } => commands::cart::add(&data_dir, &id).await?,
            CartAction::Remove { id } => commands::cart::remove(&data_dir, &id).await?,
            CartAction::Set { id, quantity } => {
                commands::cart::set(&data_dir, &id, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(&data_dir).await?,
        },
        Commands::Checkout {
            name,
            email,
            address,
            city,
            zip,
            country,
        } => {
            let form = CheckoutForm {
                name,
                email,
                address,
                city,
                zip,
                country,
            };
            commands::checkout::submit(&data_dir, form).await?;
        }
    }
    Ok(())
}
