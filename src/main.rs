//! busboard: bus listing scraper with a filtered-view server.
//!
//! `busboard scrape` drives a headless browser through the operator
//! directory and persists every listing it finds; `busboard serve` exposes
//! the accumulated store read-only over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use clap::Parser;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use busboard::cli::{self, Cli, Commands};
use busboard::config::AppConfig;
use busboard::routes::{self, AppState};
use busboard::storage::ListingRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { db, headed } => cli::run_scrape(db, headed).await,
        Commands::Serve { host, port, db } => run_server(host, port, db).await,
    }
}

/// Open the store read-only and serve filtered views.
async fn run_server(
    host: String,
    port: u16,
    db: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    config.server.host = host;
    config.server.port = port;
    if let Some(path) = db {
        config.storage.db_path = path.to_string_lossy().to_string();
    }

    tracing::info!("opening store at {}", config.storage.db_path);
    let repo = ListingRepository::new(std::path::Path::new(&config.storage.db_path))?;

    let state = Arc::new(AppState {
        repo: Mutex::new(repo),
    });

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/listings", get(routes::listings))
        .route("/listings/routes", get(routes::route_names))
        .route("/listings/operators", get(routes::operator_names))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("serving filtered views on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
