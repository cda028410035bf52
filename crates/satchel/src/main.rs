// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Satchel - operator CLI for the encrypted account vault.
//!
//! Every invocation opens the SQLite-backed persistent store with a fresh,
//! in-memory session, so commands that need the decrypted accounts ask for
//! the vault password.

mod accounts;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use satchel_config::SatchelConfig;
use satchel_core::SatchelError;

/// Satchel - an encrypted account vault for a crypto wallet.
#[derive(Parser, Debug)]
#[command(name = "satchel", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `storage.database_path`.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show whether a vault exists and which account is active.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a new vault holding one freshly generated account.
    Init {
        /// Label for the first account.
        #[arg(long)]
        name: Option<String>,
    },
    /// List the accounts in the vault.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Generate a new account and make it active.
    Create {
        /// Label for the new account.
        #[arg(long)]
        name: Option<String>,
    },
    /// Import an account from its Ed25519 private key.
    ///
    /// The hex-encoded 32-byte seed is read from SATCHEL_IMPORT_PRIVATE_KEY or
    /// a hidden prompt, never from the command line.
    Import {
        /// Label for the imported account.
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove an account from the vault.
    Remove { address: String },
    /// Set the label of an account.
    Rename { address: String, name: String },
    /// Make another account active.
    Switch { address: String },
    /// Re-encrypt the vault under a new password.
    ChangePassword,
    /// Delete the vault and every account in it.
    Clear {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => satchel_config::load_and_validate_path(path),
        None => satchel_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            satchel_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }

    init_tracing(&config.logging.level);

    let Some(command) = cli.command else {
        println!("satchel: use --help for available commands");
        return;
    };
    if let Err(e) = run(command, &config).await {
        eprintln!("satchel: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &SatchelConfig) -> Result<(), SatchelError> {
    let vault = accounts::open_vault(config).await?;
    match command {
        Commands::Status { json } => status::run_status(&vault, config, json).await,
        Commands::Init { name } => accounts::run_init(&vault, name).await,
        Commands::List { json } => accounts::run_list(&vault, json).await,
        Commands::Create { name } => accounts::run_create(&vault, name).await,
        Commands::Import { name } => accounts::run_import(&vault, name).await,
        Commands::Remove { address } => accounts::run_remove(&vault, &address).await,
        Commands::Rename { address, name } => accounts::run_rename(&vault, &address, name).await,
        Commands::Switch { address } => accounts::run_switch(&vault, &address).await,
        Commands::ChangePassword => accounts::run_change_password(&vault).await,
        Commands::Clear { yes } => accounts::run_clear(&vault, yes).await,
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "satchel={log_level},satchel_vault={log_level},satchel_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
