// src/exchange/types.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validated order on its way to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub amount: f64,
    pub contract_type: String,
    pub api_token: Option<String>,
}

/// What the broker hands back for a bought contract.
#[derive(Debug, Clone, Serialize)]
pub struct BuyReceipt {
    pub contract_id: Option<i64>,
    pub transaction_id: Option<i64>,
    pub buy_price: Option<f64>,
    pub payout: Option<f64>,
    pub longcode: Option<String>,
    pub start_time: Option<i64>,
    /// Full broker reply, relayed to the caller unchanged.
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    pub epoch: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl ta::High for Candle {
    fn high(&self) -> f64 { self.high }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 { self.low }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 { self.close }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M30,
    H1,
    D1,
}

impl Timeframe {
    /// Order in which timeframes are consulted for a signal.
    pub const PREFERENCE: [Timeframe; 3] = [Timeframe::M30, Timeframe::H1, Timeframe::D1];

    pub fn granularity_secs(self) -> u32 {
        match self {
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::D1 => 86_400,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30m" | "30min" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "1d" => Ok(Timeframe::D1),
            other => Err(format!("unsupported timeframe `{}`", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("no response within {0} seconds")]
    Timeout(u64),
    #[error("websocket closed before a response arrived")]
    Closed,
    #[error("{message} ({code})")]
    Rejected { code: String, message: String },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_labels_round_trip_through_from_str() {
        for tf in Timeframe::PREFERENCE {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("1w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn rejected_error_shows_broker_message() {
        let err = BrokerError::Rejected { code: "InvalidToken".into(), message: "The token is invalid.".into() };
        assert_eq!(err.to_string(), "The token is invalid. (InvalidToken)");
    }
}
