// src/exchange/mod.rs
use async_trait::async_trait;

pub mod deriv;
mod deriv_ws;
pub mod types;

pub use deriv::Deriv;
use types::{BrokerError, BuyReceipt, Candle, OrderRequest, Timeframe};

#[async_trait]
pub trait Broker: Send + Sync {
    async fn check_connection(&self) -> Result<(), BrokerError>;
    async fn place_order(&self, order: &OrderRequest) -> Result<BuyReceipt, BrokerError>;
    async fn candles(&self, symbol: &str, timeframe: Timeframe, count: u32) -> Result<Vec<Candle>, BrokerError>;
}
