use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Clutch performance prediction service
#[derive(Parser, Debug, Clone)]
#[command(name = "clutch-factor", version, about)]
pub struct Config {
    /// Trained model artifact (JSON). Without one, predictions are rule-based.
    #[arg(long, env = "CLUTCH_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Dashboard API listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// SQLite database path for prediction history
    #[arg(long, env = "DATABASE_PATH", default_value = "clutch_factor.db")]
    pub database_path: String,

    /// Number of rows returned by the history endpoint
    #[arg(long, env = "HISTORY_LIMIT", default_value = "50")]
    pub history_limit: i64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dashboard_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "dashboard_addr '{}' is not a valid socket address",
                self.dashboard_addr
            );
        }
        if self.database_path.trim().is_empty() {
            anyhow::bail!("database_path must not be empty");
        }
        if self.history_limit <= 0 {
            anyhow::bail!("history_limit must be positive");
        }
        Ok(())
    }
}
