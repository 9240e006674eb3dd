// src/exchange/deriv_ws/types_internal.rs

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::types::{BrokerError, BuyReceipt, Candle};

#[derive(Deserialize, Debug)]
pub(super) struct DerivEnvelope {
    #[serde(default)]
    pub(super) req_id: Option<u64>,
    #[serde(default)]
    pub(super) msg_type: Option<String>,
    #[serde(default)]
    pub(super) error: Option<DerivApiError>,
}

#[derive(Deserialize, Debug)]
pub(super) struct DerivApiError {
    #[serde(default)]
    pub(super) code: String,
    pub(super) message: String,
}

#[derive(Deserialize, Debug)]
struct DerivBuy {
    contract_id: Option<i64>,
    transaction_id: Option<i64>,
    buy_price: Option<f64>,
    payout: Option<f64>,
    longcode: Option<String>,
    start_time: Option<i64>,
}

pub(crate) fn parse_buy(reply: Value) -> Result<BuyReceipt, BrokerError> {
    let body = reply
        .get("buy")
        .ok_or_else(|| BrokerError::UnexpectedResponse("buy reply without `buy` field".into()))?;
    let buy: DerivBuy = serde_path_to_error::deserialize(body)
        .map_err(|e| BrokerError::UnexpectedResponse(format!("buy at {}: {}", e.path(), e.inner())))?;

    Ok(BuyReceipt {
        contract_id: buy.contract_id,
        transaction_id: buy.transaction_id,
        buy_price: buy.buy_price,
        payout: buy.payout,
        longcode: buy.longcode,
        start_time: buy.start_time,
        raw: reply,
    })
}

pub(crate) fn parse_candles(reply: &Value) -> Result<Vec<Candle>, BrokerError> {
    let Some(body) = reply.get("candles") else {
        return Ok(Vec::new());
    };
    let mut candles: Vec<Candle> = serde_path_to_error::deserialize(body)
        .map_err(|e| BrokerError::UnexpectedResponse(format!("candles at {}: {}", e.path(), e.inner())))?;
    candles.sort_by_key(|c| c.epoch);
    Ok(candles)
}
