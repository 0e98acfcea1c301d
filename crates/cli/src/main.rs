//! Fashion Store CLI - Catalog seeding and reporting.
//!
//! # Usage
//!
//! ```bash
//! # Load a demo catalog into the data service
//! fs-cli seed --file catalog.yaml
//!
//! # Check a catalog file without writing anything
//! fs-cli seed --file catalog.yaml --dry-run
//!
//! # Print the dashboard figures
//! fs-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `DATA_SERVICE_URL` - Hosted data service project URL
//! - `DATA_SERVICE_SERVICE_KEY` - Service key (bypasses row policies)
//! - `DATA_SERVICE_TIMEOUT_SECS` - Per-request timeout (default: 10)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fs-cli")]
#[command(author, version, about = "Fashion Store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load categories and products from a YAML catalog
    Seed {
        /// Path to the catalog file
        #[arg(short, long)]
        file: String,

        /// Validate the file without writing to the data service
        #[arg(long)]
        dry_run: bool,
    },
    /// Print revenue and counts of orders, products and customers
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { file, dry_run } => commands::seed::catalog(&file, dry_run).await?,
        Commands::Stats => commands::stats::show().await?,
    }
    Ok(())
}
