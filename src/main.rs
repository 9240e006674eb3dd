use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use trade_relay::exchange::{Broker, Deriv};
use trade_relay::relay::{self, AppState};
use trade_relay::{config, logger, storage};

#[tokio::main]
async fn main() -> Result<()> {
    // 1) .env, config, logger
    dotenv::dotenv().ok();
    let cfg = config::Config::load()?;
    logger::init(&cfg);
    if cfg.serial_keys.is_empty() {
        warn!("No serial keys configured, every trade request will be rejected.");
    }

    // 2) SQLite trade journal
    let db = storage::Db::connect(&cfg.sqlite_path).await?;

    // 3) broker client + ping; an unreachable broker is not fatal for the relay
    let deriv = Deriv::from_config(&cfg)?;
    if let Err(e) = deriv.check_connection().await {
        warn!("Deriv connection check failed: {}", e);
    }

    // 4) HTTP server
    let state = AppState::new(cfg, Arc::new(deriv), db);
    relay::serve(state).await
}
