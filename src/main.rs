use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::{info, warn};

use clutch_factor::config::Config;
use clutch_factor::dashboard::{self, AppState};
use clutch_factor::db::Database;
use clutch_factor::engine::ClutchPredictor;
use clutch_factor::loader::load_model;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // A missing or broken model is not fatal: predictions fall back to rules.
    let model = match &config.model_path {
        Some(path) => match load_model(path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Model unavailable ({}), using rule-based scorer", e);
                None
            }
        },
        None => {
            info!("No model configured, using rule-based scorer");
            None
        }
    };
    let predictor = ClutchPredictor::new(model);

    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let state = AppState {
        predictor,
        db,
        history_limit: config.history_limit,
    };
    let app = dashboard::router(state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
