// src/relay/state.rs

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::Config;
use crate::exchange::Broker;
use crate::models::TradeUpdate;
use crate::storage::Db;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub broker: Arc<dyn Broker>,
    pub db: Db,
    pub updates: broadcast::Sender<TradeUpdate>,
}

impl AppState {
    pub fn new(config: Config, broker: Arc<dyn Broker>, db: Db) -> Self {
        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Self { config: Arc::new(config), broker, db, updates }
    }

    /// Fan-out to `/ws` clients. Having no clients is not an error.
    pub fn publish(&self, update: TradeUpdate) {
        let event = update.event;
        match self.updates.send(update) {
            Ok(n) => debug!(event, receivers = n, "Update broadcast"),
            Err(_) => debug!(event, "Update dropped, no websocket clients"),
        }
    }
}
