//! Bazaar CLI - session-store migrations and shop config checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table in the storefront database
//! bazaar migrate storefront
//!
//! # Create the session table in the admin database
//! bazaar migrate admin
//!
//! # Both
//! bazaar migrate all
//!
//! # Validate a shops file (defaults to STOREFRONT_SHOPS_FILE or shops.yaml)
//! bazaar shops check shops.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run session-store migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Inspect tenant configuration
    Shops {
        #[command(subcommand)]
        action: ShopsAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session database
    Storefront,
    /// Admin session database
    Admin,
    /// Both session databases
    All,
}

#[derive(Subcommand)]
enum ShopsAction {
    /// Load and validate a shops file
    Check {
        /// Path to the shops file
        file: Option<PathBuf>,
    },
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Shops { action } => match action {
            ShopsAction::Check { file } => commands::shops::check(file)?,
        },
    }
    Ok(())
}
