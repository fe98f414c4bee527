use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use alumni_api::app::{app, AppState};
use alumni_api::config::{AppConfig, StoreBackend};
use alumni_api::services::UserService;
use alumni_api::store::create_store;

#[derive(Parser, Debug)]
#[command(name = "alumni-api")]
#[command(about = "Alumni and employment tracking API server")]
#[command(version)]
struct Args {
    /// Listen port (overrides API_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Record store backend: postgres, mongodb or memory (overrides DB_TYPE)
    #[arg(long)]
    db_type: Option<StoreBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alumni_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(backend) = args.db_type {
        config.store.backend = backend;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }
    tracing::info!(
        environment = ?config.environment,
        backend = ?config.store.backend,
        denial = ?config.security.ownership_denial,
        "Starting Alumni API"
    );

    let store = create_store(&config.store).await.context("failed to initialise record store")?;

    if let (Some(username), Some(password)) = (&config.store.seed_admin_username, &config.store.seed_admin_password) {
        UserService::new(store.clone())
            .ensure_admin(username, password)
            .await
            .context("failed to seed admin account")?;
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(store, config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Alumni API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
