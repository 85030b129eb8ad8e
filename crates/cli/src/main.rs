//! Kaimono CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! kaimono products list --category tops --max-price 5000
//! kaimono products show 12
//!
//! # Fill the cart (persisted under $KAIMONO_DATA_DIR)
//! kaimono cart add 12 -q 2
//! kaimono cart set 12 0        # removes the line
//! kaimono cart show
//!
//! # Buy
//! kaimono login -u mika -p secret
//! kaimono checkout --name "Sato Mika" --phone 090-1234-5678 \
//!     --postal-code 150-0001 --prefecture 東京都 --city 渋谷区 --address1 神宮前1-2-3
//! ```
//!
//! # Commands
//!
//! - `products`, `categories`, `shop` - Catalog browsing
//! - `cart` - Local cart management
//! - `login`, `logout`, `whoami`, `register` - Account
//! - `checkout`, `orders` - Ordering
//! - `store` - Seller listings
//! - `admin` - User administration

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use kaimono_core::{CategoryId, OrderId, Price, ProductId, UserId};
use kaimono_storefront::{AppState, StorefrontConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "kaimono")]
#[command(author, version, about = "Kaimono terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// Show a seller's shop
    Shop {
        /// Seller's user ID
        user_id: UserId,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "KAIMONO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the session (the cart is kept)
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "KAIMONO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Order everything in the cart
    Checkout(commands::orders::CheckoutArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage your own listings
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// User administration (admins only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List available products
    List {
        /// Category slug (e.g. `tops`)
        #[arg(short, long)]
        category: Option<String>,

        /// Highest price to show, inclusive
        #[arg(short, long)]
        max_price: Option<Price>,
    },
    /// Show one product
    Show { id: ProductId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add a product, merging with an existing line
    Add {
        id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product's line
    Remove { id: ProductId },
    /// Set a line's quantity; zero or less removes it
    Set {
        id: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: OrderId },
}

#[derive(Subcommand)]
enum StoreAction {
    /// List your products, sold ones included
    List,
    /// List a new product for sale
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: Price,

        #[arg(short, long)]
        category_id: CategoryId,

        #[arg(short, long, default_value_t = 1)]
        stock: u32,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        image_url: Option<String>,
    },
    /// Edit one of your products
    Edit {
        id: ProductId,

        #[command(flatten)]
        fields: commands::store::EditArgs,
    },
    /// Delete one of your products
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List all users
    Users,
    /// Change a user's role or active flag
    UpdateUser {
        id: UserId,

        #[command(flatten)]
        fields: commands::admin::UpdateUserArgs,
    },
    /// Delete a user and their listings
    DeleteUser { id: UserId },
}

fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = StorefrontConfig::from_env();

    // Sentry must be initialized before the subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Logs go to stderr so stdout stays clean for output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,kaimono=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CommandError> {
    let mut state = AppState::new(config)?;
    let mut out = std::io::stdout();

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                max_price,
            } => commands::catalog::list(&state, &mut out, category, max_price).await?,
            ProductsAction::Show { id } => commands::catalog::show(&state, &mut out, id).await?,
        },
        Commands::Categories => commands::catalog::categories(&state, &mut out).await?,
        Commands::Shop { user_id } => commands::catalog::shop(&state, &mut out, user_id).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state, &mut out)?,
            CartAction::Add { id, quantity } => {
                commands::cart::add(&mut state, &mut out, id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&mut state, &mut out, id)?,
            CartAction::Set { id, quantity } => {
                commands::cart::set(&mut state, &mut out, id, quantity)?;
            }
            CartAction::Clear => commands::cart::clear(&mut state, &mut out)?,
        },
        Commands::Login { username, password } => {
            commands::account::login(&mut state, &mut out, &username, password).await?;
        }
        Commands::Logout => commands::account::logout(&mut state, &mut out)?,
        Commands::Whoami => commands::account::whoami(&mut state, &mut out).await?,
        Commands::Register {
            email,
            username,
            password,
        } => commands::account::register(&state, &mut out, &email, username, password).await?,
        Commands::Checkout(args) => commands::orders::checkout(&mut state, &mut out, args).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&state, &mut out).await?,
            OrdersAction::Show { id } => commands::orders::show(&state, &mut out, id).await?,
        },
        Commands::Store { action } => match action {
            StoreAction::List => commands::store::list(&state, &mut out).await?,
            StoreAction::Create {
                name,
                price,
                category_id,
                stock,
                description,
                image_url,
            } => {
                let product = kaimono_storefront::api::NewProduct {
                    name,
                    description,
                    price,
                    category_id,
                    image_url,
                    stock,
                };
                commands::store::create(&state, &mut out, &product).await?;
            }
            StoreAction::Edit { id, fields } => commands::store::edit(&state, &mut out, id, fields).await?,
            StoreAction::Delete { id } => commands::store::delete(&state, &mut out, id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Users => commands::admin::users(&mut state, &mut out).await?,
            AdminAction::UpdateUser { id, fields } => {
                commands::admin::update_user(&mut state, &mut out, id, fields).await?;
            }
            AdminAction::DeleteUser { id } => {
                commands::admin::delete_user(&mut state, &mut out, id).await?;
            }
        },
    }
    Ok(())
}
