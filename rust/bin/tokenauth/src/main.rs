//! `tokenauth` — migration CLI.
//!
//! Usage:
//!   tokenauth --sqlite <path> [--config <file.toml>] migrate
//!   tokenauth --sqlite <path> [--config <file.toml>] status
//!   tokenauth --sqlite <path> [--config <file.toml>] rollback [STEPS]
//!
//! The optional config file is TOML with the same fields as
//! `AuthOptions`; unset fields keep their defaults.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use tokenauth_core::AuthOptions;
use tokenauth_migrate::{MigrationManager, builtin_registry};
use tokenauth_sql::{SQLStore, SqliteStore};

/// Token authentication schema tool.
#[derive(Parser, Debug)]
#[command(name = "tokenauth", about = "Token authentication schema tool")]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long = "sqlite", default_value = "tokenauth.db")]
    sqlite: PathBuf,

    /// Path to a TOML config file (AuthOptions fields).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply all pending migrations.
    #[command(alias = "up")]
    Migrate,

    /// Show executed and pending migrations.
    Status,

    /// Roll back the most recent migrations.
    #[command(alias = "down")]
    Rollback {
        /// Number of migrations to undo.
        #[arg(default_value_t = 1)]
        steps: usize,
    },
}

fn load_options(path: Option<&PathBuf>) -> anyhow::Result<AuthOptions> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", p.display(), e))?;
            let options: AuthOptions = toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", p.display(), e))?;
            Ok(options)
        }
        None => Ok(AuthOptions::default()),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = load_options(cli.config.as_ref())?;

    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&cli.sqlite)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let manager = MigrationManager::new(sql, builtin_registry(), options);

    match cli.command {
        Commands::Migrate => {
            println!("Running database migrations...");
            let applied = manager.migrate()?;
            if applied == 0 {
                println!("Nothing to migrate.");
            } else {
                println!("Applied {applied} migration(s).");
            }
        }
        Commands::Status => {
            let status = manager.status();
            println!("Executed migrations:");
            if status.executed.is_empty() {
                println!("  (none)");
            }
            for entry in &status.executed {
                println!("  ✓ {} (v{}) - {}", entry.name, entry.version, entry.executed_at);
            }
            println!("Pending migrations:");
            if status.pending.is_empty() {
                println!("  (none)");
            }
            for info in &status.pending {
                println!("  • {} (v{})", info.name, info.version);
            }
        }
        Commands::Rollback { steps } => {
            println!("Rolling back up to {steps} migration(s)...");
            let undone = manager.rollback(steps)?;
            if undone == 0 {
                println!("Nothing to roll back.");
            } else {
                println!("Rolled back {undone} migration(s).");
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
