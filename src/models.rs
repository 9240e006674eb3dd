// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exchange::types::OrderRequest;

/// Body of `POST /trade`.
#[derive(Debug, Default, Deserialize)]
pub struct TradeRequest {
    #[serde(default, rename = "serialKey")]
    pub serial_key: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "num_or_str_as_f64_option::deserialize")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub deriv_api_token: Option<String>,
}

impl TradeRequest {
    /// `None` when a required field is missing, blank or the amount is not positive.
    pub fn to_order(&self) -> Option<OrderRequest> {
        let symbol = non_blank(&self.symbol)?;
        let contract_type = non_blank(&self.contract_type)?;
        let amount = positive(self.amount)?;
        Some(OrderRequest {
            symbol,
            amount,
            contract_type,
            api_token: non_blank(&self.deriv_api_token),
        })
    }
}

/// Body of `POST /api/trade`.
#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "num_or_str_as_f64_option::deserialize")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default = "default_stop_loss_percent", deserialize_with = "num_or_str_as_f64::deserialize")]
    pub stop_loss_percent: f64,
    #[serde(default = "default_take_profit_percent", deserialize_with = "num_or_str_as_f64::deserialize")]
    pub take_profit_percent: f64,
}

fn default_stop_loss_percent() -> f64 { 1.0 }
fn default_take_profit_percent() -> f64 { 2.0 }

impl SignalRequest {
    /// Symbol to analyse, if the request carries everything the analysis needs.
    pub fn validated_symbol(&self) -> Option<String> {
        non_blank(&self.contract_type)?;
        positive(self.amount)?;
        non_blank(&self.symbol)
    }
}

/// Event pushed to every `/ws` subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct TradeUpdate {
    pub event: &'static str,
    pub data: Value,
    pub timestamp: i64,
}

impl TradeUpdate {
    pub const TRADE: &'static str = "tradeUpdate";
    pub const SIGNAL: &'static str = "signalUpdate";

    pub fn trade(data: Value) -> Self {
        Self { event: Self::TRADE, data, timestamp: chrono::Utc::now().timestamp_millis() }
    }

    pub fn signal(data: Value) -> Self {
        Self { event: Self::SIGNAL, data, timestamp: chrono::Utc::now().timestamp_millis() }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

// --- Lenient numeric fields: JSON number or numeric string ---
pub(crate) mod num_or_str_as_f64_option {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::{FromStr, ToPrimitive};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => Decimal::from_str(s.trim()).ok().and_then(|d| d.to_f64()),
            _ => None,
        })
    }
}

pub(crate) mod num_or_str_as_f64 {
    use serde::{Deserializer, de::Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::num_or_str_as_f64_option::deserialize(deserializer)?
            .ok_or_else(|| D::Error::custom("expected a number"))
    }
}
