//! Shopdesk CLI - Talk to the assistant and inspect the demo store.
//!
//! # Usage
//!
//! ```bash
//! # Chat with the assistant as customer 1, in Spanish
//! shopdesk chat --customer 1 --language es
//!
//! # Search the catalog
//! shopdesk search --query jeans
//! shopdesk search --category footwear
//!
//! # Show a customer's order history
//! shopdesk orders --customer 1
//!
//! # List demo customers
//! shopdesk customers
//! ```
//!
//! # Commands
//!
//! - `chat` - Interactive text chat (`/cart`, `/reset`, `/quit`)
//! - `search` - Catalog search, at most five results
//! - `orders` - Order history of a customer
//! - `customers` - Demo customer list

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopdesk_core::{CustomerId, Language};

mod commands;

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(author, version, about = "Shopdesk support assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant on the text channel
    Chat {
        /// Customer to act as (default: `SHOPDESK_CUSTOMER_ID` or the first customer)
        #[arg(short, long)]
        customer: Option<i32>,

        /// Conversation language code (en, es, fr, de)
        #[arg(short, long)]
        language: Option<Language>,
    },
    /// Search the catalog
    Search {
        /// Product name to look for
        #[arg(short, long)]
        query: Option<String>,

        /// Category to filter by
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show a customer's order history
    Orders {
        /// Customer id (default: the active customer)
        #[arg(short, long)]
        customer: Option<i32>,
    },
    /// List demo customers
    Customers,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopdesk_agent=warn,shopdesk_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Chat { customer, language } => {
            commands::chat::run(customer.map(CustomerId::new), language).await?;
        }
        Commands::Search { query, category } => {
            commands::catalog::search(query.as_deref(), category.as_deref())?;
        }
        Commands::Orders { customer } => {
            commands::catalog::orders(customer.map(CustomerId::new))?;
        }
        Commands::Customers => commands::catalog::customers()?,
    }
    Ok(())
}
