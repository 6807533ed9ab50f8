//! Tidepool CLI - Catalog seeding and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed the built-in demo catalog
//! tp-cli seed products
//!
//! # Seed products from a JSON file
//! tp-cli seed products --file catalog.json
//!
//! # Seed the home carousels
//! tp-cli seed carousels
//!
//! # Seed everything
//! tp-cli seed all
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(author, version, about = "Tidepool Commerce CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the backend with catalog data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed the products collection
    Products {
        /// JSON file with a seed document; defaults to the built-in catalog
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Seed the home carousels collection
    Carousels {
        /// JSON file with a seed document; defaults to the built-in catalog
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Seed products and carousels
    All {
        /// JSON file with a seed document; defaults to the built-in catalog
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(file.as_deref()).await,
            SeedTarget::Carousels { file } => commands::seed::carousels(file.as_deref()).await,
            SeedTarget::All { file } => commands::seed::all(file.as_deref()).await,
        },
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
