//! CLI entry point for appkit.
//!
//! Provides the `appkit` command with subcommands to initialize storage,
//! check its status and manage the components of each app.

mod cli;
mod commands;
mod config;

use std::path::Path;

use anyhow::{Context, Result};
use appkit_store::{ComponentStore, Database, SqliteMetadataStore, migration};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let Cli {
        config: config_path,
        json,
        command,
    } = Cli::parse();
    let config = Config::load(&config_path)?;

    match command {
        Commands::Setup => {
            init_tracing(&config.log.level);
            cmd_setup(&config).await
        }
        Commands::Status => {
            init_tracing("warn");
            cmd_status(&config_path, &config).await
        }
        Commands::Components { app, action } => {
            init_tracing(&config.log.level);
            let store = open_store(&config).await?;
            let report =
                commands::run(&store, app, action, &config.components.known_types).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: setup
// ---------------------------------------------------------------------------

async fn cmd_setup(config: &Config) -> Result<()> {
    println!();
    println!("  appkit setup");
    println!("  ============");
    println!();

    let data_dir = &config.store.data_dir;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir).context("failed to create data directory")?;
        println!("  [+] Created data directory {}", data_dir.display());
    } else {
        println!("  [=] Data directory already exists");
    }

    let db_path = config.store.database_path();
    let display_path = db_path.display().to_string();
    Database::open_and_migrate(db_path)
        .await
        .context("failed to initialize database")?;
    info!(path = %display_path, "database ready");
    println!("  [+] Database initialized at {display_path}");

    println!();
    println!("  Setup complete! Run `appkit components --app <id> list` to start.");
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

async fn cmd_status(config_path: &Path, config: &Config) -> Result<()> {
    println!();
    println!("  appkit status");
    println!("  =============");
    println!();

    if config.store.data_dir.exists() {
        println!("  Data directory:   OK ({})", config.store.data_dir.display());
    } else {
        println!("  Data directory:   MISSING (run `appkit setup`)");
    }

    if config_path.exists() {
        println!("  Config:           OK ({})", config_path.display());
    } else {
        println!("  Config:           MISSING (using defaults)");
    }

    let db_path = config.store.database_path();
    if db_path.exists() {
        println!("  Database:         OK ({})", db_path.display());
        let db = Database::open_read_only(&db_path).context("failed to open database")?;
        let version = db.schema_version().await?;
        if version < migration::latest_version() {
            println!("  Schema:           OUTDATED (v{version}, run `appkit setup`)");
        } else {
            let store = ComponentStore::new(SqliteMetadataStore::new(db));
            let apps = store.apps().await?;
            let mut total = 0;
            for app in &apps {
                total += store.count(*app).await?;
            }
            println!(
                "  Components:       {total} across {} app(s)",
                apps.len()
            );
        }
    } else {
        println!("  Database:         NOT INITIALIZED (run `appkit setup`)");
    }

    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn open_store(config: &Config) -> Result<ComponentStore<SqliteMetadataStore>> {
    let db_path = config.store.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    debug!(path = %db_path.display(), "opening component store");
    let db = Database::open_and_migrate(db_path)
        .await
        .context("failed to open database")?;
    Ok(ComponentStore::new(SqliteMetadataStore::new(db)))
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over `default_level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
