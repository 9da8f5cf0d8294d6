//! Boutique CLI - browse the shop, manage a cart, and run the back office.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! boutique catalog list --search casque
//! boutique catalog show 67e55044-10b1-426f-9247-bb680e5fe0c8
//!
//! # Cart and WhatsApp checkout
//! boutique cart add 67e55044-10b1-426f-9247-bb680e5fe0c8
//! boutique checkout
//!
//! # Back office
//! BOUTIQUE_ADMIN_PASSWORD=... boutique admin login admin@example.com
//! boutique admin category add "Audio"
//! ```
//!
//! # Commands
//!
//! - `catalog` - List, show and categorize products
//! - `cart` - Show and edit the current cart
//! - `checkout` - Compose the WhatsApp order and clear the cart
//! - `contact` - Print the shop's WhatsApp contact link
//! - `whoami` - Show who the cart belongs to
//! - `admin` - Sign in and manage products, categories and settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use boutique_core::{CategoryId, ProductId};
use boutique_storefront::AppState;
use boutique_storefront::config::StorefrontConfig;
use boutique_storefront::notify::TracingNotifier;

mod commands;
mod error;
mod output;
mod telemetry;

use error::Result;

#[derive(Parser)]
#[command(name = "boutique")]
#[command(author, version, about = "Boutique shop CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Compose the WhatsApp order for the cart, then clear it
    Checkout,
    /// Print the shop's WhatsApp contact link
    Contact,
    /// Show who the cart belongs to
    Whoami,
    /// Back-office commands
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, newest first
    List {
        /// Only products in this category
        #[arg(long)]
        category: Option<CategoryId>,
        /// Case-insensitive search on name and description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Show { id: ProductId },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and total
    Show,
    /// Add one unit of a product
    Add { id: ProductId },
    /// Set a line's quantity (values below 1 are ignored)
    Set {
        id: ProductId,
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Sign in (password from `BOUTIQUE_ADMIN_PASSWORD` or one stdin line)
    Login { email: String },
    /// Sign out
    Logout,
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Show or change shop settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Update a product; omitted fields keep their value
    Update {
        id: ProductId,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(clap::Args)]
struct ProductFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Category id
    #[arg(long)]
    category: Option<String>,
    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Add a category
    Add { name: String },
    /// Rename a category
    Rename { id: CategoryId, name: String },
    /// Delete a category
    Delete { id: CategoryId },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the settings row
    Show,
    /// Change settings; omitted fields keep their value
    Set {
        #[arg(long)]
        shop_name: Option<String>,
        #[arg(long)]
        contact_email: Option<String>,
        #[arg(long)]
        whatsapp: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// `fr` or `en`
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(config.log_format, sentry_guard.is_some());

    let cli = Cli::parse();

    // French until `start` reads the settings row
    let notifier = Arc::new(TracingNotifier::default());
    let state = AppState::from_config(&config, notifier).expect("Failed to build backend client");

    if let Err(e) = run(&state, cli).await {
        tracing::error!(error = %e, "Command failed");
        output::error(&e.user_message(state.settings().language()));
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(state: &AppState, cli: Cli) -> Result<()> {
    state.start().await?;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, search } => {
                commands::catalog::list(state, category, search).await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(state, id).await?,
            CatalogAction::Categories => commands::catalog::categories(state).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state).await?,
            CartAction::Add { id } => commands::cart::add(state, id).await?,
            CartAction::Set { id, quantity } => commands::cart::set(state, id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(state, id).await?,
            CartAction::Clear => commands::cart::clear(state).await?,
        },
        Commands::Checkout => commands::cart::checkout(state).await?,
        Commands::Contact => commands::cart::contact(state).await,
        Commands::Whoami => commands::cart::whoami(state)?,
        Commands::Admin { action } => match action {
            AdminAction::Login { email } => commands::admin::login(state, &email).await?,
            AdminAction::Logout => commands::admin::logout(state).await?,
            AdminAction::Product { action } => match action {
                ProductAction::Create { fields } => {
                    commands::admin::create_product(state, fields.into()).await?;
                }
                ProductAction::Update { id, fields } => {
                    commands::admin::update_product(state, id, fields.into()).await?;
                }
                ProductAction::Delete { id } => commands::admin::delete_product(state, id).await?,
            },
            AdminAction::Category { action } => match action {
                CategoryAction::Add { name } => commands::admin::add_category(state, &name).await?,
                CategoryAction::Rename { id, name } => {
                    commands::admin::rename_category(state, id, &name).await?;
                }
                CategoryAction::Delete { id } => commands::admin::delete_category(state, id).await?,
            },
            AdminAction::Settings { action } => match action {
                SettingsAction::Show => commands::admin::show_settings(state).await?,
                SettingsAction::Set {
                    shop_name,
                    contact_email,
                    whatsapp,
                    address,
                    language,
                } => {
                    commands::admin::set_settings(
                        state,
                        commands::admin::SettingsChanges {
                            shop_name,
                            contact_email,
                            whatsapp,
                            address,
                            language,
                        },
                    )
                    .await?;
                }
            },
        },
    }
    Ok(())
}

impl From<ProductFields> for commands::admin::ProductChanges {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            price: fields.price,
            description: fields.description,
            category: fields.category,
            image: fields.image,
        }
    }
}
