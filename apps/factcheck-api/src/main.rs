//! Fact-check API Server
//!
//! Checks natural-language claims against an indexed corpus of government
//! press releases. Provides REST endpoints for:
//!
//! - Claim checking (single and batch)
//! - Evidence search
//! - Health and index statistics

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use factcheck_core::FactCheckConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod handlers;
mod state;

use state::AppState;

/// Command-line arguments for the fact-check server
#[derive(Parser, Debug)]
#[command(name = "factcheck-api")]
#[command(about = "HTTP API for checking claims against press releases")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Index snapshot to serve (overrides FACTCHECK_INDEX_PATH)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Build the router over shared state
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        // Checking
        .route("/check", post(handlers::check))
        .route("/check/batch", post(handlers::check_batch))
        // Retrieval
        .route("/search", post(handlers::search))
        // Apply middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = FactCheckConfig::from_env()?;
    if let Some(index) = args.index {
        config.index_path = index;
    }

    info!("Initializing application state...");
    let state = Arc::new(AppState::from_config(config)?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
