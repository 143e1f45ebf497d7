//! `tokenauthd` — demo API server gated by token authentication.
//!
//! Usage:
//!   tokenauthd [--sqlite <path>] [--config <file.toml>] [--listen <addr>]
//!
//! Runs pending schema migrations at startup, then serves a small API:
//! `POST /api/auth/login` (exempt), `GET /api/auth/me` (protected), and
//! `/health` (outside the protected prefix).

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use tokenauth_auth::{AuthGate, TokenIssuer};
use tokenauth_core::AuthOptions;
use tokenauth_migrate::{MigrationManager, builtin_registry};
use tokenauth_sql::{SQLStore, SqliteStore};

use routes::AppState;

const LOGIN_ROUTE: &str = "POST:/api/auth/login";

/// Token authentication demo server.
#[derive(Parser, Debug)]
#[command(name = "tokenauthd", about = "Token authentication demo server")]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long = "sqlite", default_value = "tokenauth.db")]
    sqlite: PathBuf,

    /// Path to a TOML config file (AuthOptions fields).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

fn load_options(path: Option<&PathBuf>) -> anyhow::Result<AuthOptions> {
    let mut options = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", p.display(), e))?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", p.display(), e))?
        }
        None => AuthOptions::default(),
    };

    // The login route must stay reachable without a token.
    if !options.no_auth_routes.iter().any(|r| r == LOGIN_ROUTE) {
        options.no_auth_routes.push(LOGIN_ROUTE.to_string());
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let options = load_options(cli.config.as_ref())?;

    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&cli.sqlite)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // Bring the schema up to date before serving.
    let manager = MigrationManager::new(sql.clone(), builtin_registry(), options.clone());
    let applied = manager.migrate()?;
    if applied > 0 {
        info!("Applied {applied} pending migration(s)");
    }

    let gate = Arc::new(
        AuthGate::new(sql.clone(), options.clone())
            .map_err(|e| anyhow::anyhow!("failed to build auth gate: {}", e))?,
    );
    let issuer = Arc::new(
        TokenIssuer::new(sql, &options)
            .map_err(|e| anyhow::anyhow!("failed to build token issuer: {}", e))?,
    );

    let app = routes::build_router(AppState { gate, issuer });

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("tokenauthd listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
