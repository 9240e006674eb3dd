// src/exchange/deriv.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::Broker;
use crate::config::Config;
use crate::exchange::deriv_ws::{self, ContractParams, Session};
use crate::exchange::types::{BrokerError, BuyReceipt, Candle, OrderRequest, Timeframe};

/// Deriv websocket API client. Every call opens its own socket.
#[derive(Debug, Clone)]
pub struct Deriv {
    endpoint: Url,
    default_token: Option<String>,
    contract: ContractParams,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl Deriv {
    /// `base_url` without query, e.g. `wss://ws.derivws.com/websockets/v3`.
    /// Everything else comes from the configuration defaults.
    pub fn new(base_url: &str, app_id: &str) -> Result<Self> {
        Self::from_config(&Config {
            deriv_ws_url: base_url.to_string(),
            deriv_app_id: app_id.to_string(),
            deriv_api_token: None,
            ..Config::default()
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut endpoint = Url::parse(&cfg.deriv_ws_url)
            .map_err(|e| anyhow!("Invalid Deriv URL `{}`: {}", cfg.deriv_ws_url, e))?;
        endpoint.query_pairs_mut().append_pair("app_id", &cfg.deriv_app_id);

        Ok(Self {
            endpoint,
            default_token: cfg.deriv_api_token.clone().filter(|t| !t.trim().is_empty()),
            contract: ContractParams {
                currency: cfg.currency.clone(),
                basis: cfg.contract_basis.clone(),
                duration: cfg.contract_duration,
                duration_unit: cfg.contract_duration_unit.clone(),
            },
            connect_timeout: cfg.connect_timeout(),
            response_timeout: cfg.response_timeout(),
        })
    }

    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn session(&self) -> Result<Session, BrokerError> {
        Session::open(self.endpoint.as_str(), self.connect_timeout, self.response_timeout).await
    }

    async fn buy_in(&self, session: &mut Session, order: &OrderRequest) -> Result<BuyReceipt, BrokerError> {
        let token = order.api_token.as_deref().or(self.default_token.as_deref());
        match token {
            Some(token) => {
                session.request(deriv_ws::authorize(token), "authorize").await?;
            }
            None => warn!(symbol = %order.symbol, "Placing order without an API token."),
        }
        let reply = session.request(deriv_ws::buy(order, &self.contract), "buy").await?;
        deriv_ws::parse_buy(reply)
    }
}

#[async_trait]
impl Broker for Deriv {
    async fn check_connection(&self) -> Result<(), BrokerError> {
        let mut session = self.session().await?;
        let result = session.request(deriv_ws::ping(), "ping").await;
        session.close().await;
        result.map(|_| info!("Deriv ping OK"))
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<BuyReceipt, BrokerError> {
        info!(symbol = %order.symbol, amount = order.amount, contract_type = %order.contract_type, "Relaying order to Deriv");
        let mut session = self.session().await?;
        let result = self.buy_in(&mut session, order).await;
        session.close().await;
        result
    }

    async fn candles(&self, symbol: &str, timeframe: Timeframe, count: u32) -> Result<Vec<Candle>, BrokerError> {
        let mut session = self.session().await?;
        let result = session
            .request(deriv_ws::ticks_history(symbol, timeframe.granularity_secs(), count), "candles")
            .await;
        session.close().await;
        let candles = deriv_ws::parse_candles(&result?)?;
        info!(symbol, timeframe = %timeframe, count = candles.len(), "Fetched candles from Deriv");
        Ok(candles)
    }
}
