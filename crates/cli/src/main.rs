//! Bramble CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bramble migrate
//!
//! # Seed the database with demo data
//! bramble seed
//!
//! # Grant or revoke staff status
//! bramble staff grant -u alice
//! bramble staff revoke -u alice
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed database with demo data
//! - `staff` - Manage staff status for existing users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bramble")]
#[command(author, version, about = "Bramble Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Manage staff status
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Grant staff status to a user
    Grant {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
    /// Revoke staff status from a user
    Revoke {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Grant { username } => {
                commands::staff::set_staff(&username, true).await?;
            }
            StaffAction::Revoke { username } => {
                commands::staff::set_staff(&username, false).await?;
            }
        },
    }
    Ok(())
}
