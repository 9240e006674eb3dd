// src/logger.rs

use crate::config::Config;
use tracing_subscriber::fmt;
use tracing_subscriber::filter::EnvFilter;

/// Tracing setup. `RUST_LOG` wins, otherwise `info` plus request traces.
pub fn init(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::info!(
        "Logger initialized. Deriv endpoint = {}, serial keys loaded = {}",
        cfg.deriv_ws_url,
        cfg.serial_keys.len()
    );
}
