//! Storedesk CLI - Database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run dashboard database migrations
//! sd-cli migrate
//!
//! # Create a store for an identity-provider user
//! sd-cli store create -n "Corner Shop" -u user_2abc
//!
//! # List a user's stores
//! sd-cli store list -u user_2abc
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `store create` / `store list` - Manage stores without the dashboard

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Storedesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a store owned by a user
    Create {
        /// Store name
        #[arg(short, long)]
        name: String,

        /// Identity-provider user id of the owner
        #[arg(short, long)]
        user: String,
    },
    /// List the stores owned by a user
    List {
        /// Identity-provider user id
        #[arg(short, long)]
        user: String,
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
        Commands::Store { action } => match action {
            StoreAction::Create { name, user } => {
                commands::store::create(&name, &user).await?;
            }
            StoreAction::List { user } => commands::store::list(&user).await?,
        },
    }
    Ok(())
}
