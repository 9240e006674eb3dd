// src/exchange/deriv_ws/protocol.rs

use serde_json::{json, Value};
use tracing::warn;

use crate::exchange::deriv_ws::types_internal::DerivEnvelope;
use crate::exchange::types::{BrokerError, OrderRequest};

/// Contract settings that are fixed by configuration rather than by the caller.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContractParams {
    pub currency: String,
    pub basis: String,
    pub duration: u32,
    pub duration_unit: String,
}

// --- Outgoing messages ---
pub(crate) fn authorize(token: &str) -> Value {
    json!({ "authorize": token })
}

pub(crate) fn buy(order: &OrderRequest, params: &ContractParams) -> Value {
    json!({
        "buy": "1",
        "price": order.amount,
        "parameters": {
            "amount": order.amount,
            "basis": params.basis,
            "contract_type": order.contract_type,
            "currency": params.currency,
            "duration": params.duration,
            "duration_unit": params.duration_unit,
            "symbol": order.symbol,
        }
    })
}

pub(crate) fn ticks_history(symbol: &str, granularity_secs: u32, count: u32) -> Value {
    json!({
        "ticks_history": symbol,
        "adjust_start_time": 1,
        "count": count,
        "end": "latest",
        "style": "candles",
        "granularity": granularity_secs,
    })
}

pub(crate) fn ping() -> Value {
    json!({ "ping": 1 })
}

// --- Incoming messages ---

/// `Ok(Some(reply))` when `text` answers request `req_id`, `Ok(None)` when it
/// belongs to something else. A broker `error` in the reply becomes `Rejected`.
pub(crate) fn match_reply(text: &str, req_id: u64, msg_type: &str) -> Result<Option<Value>, BrokerError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BrokerError::Protocol(format!("invalid JSON from broker: {}", e)))?;
    let envelope: DerivEnvelope = serde_json::from_value(value.clone())
        .map_err(|e| BrokerError::Protocol(format!("invalid envelope from broker: {}", e)))?;

    let matches = match envelope.req_id {
        Some(id) => id == req_id,
        None => envelope.msg_type.as_deref() == Some(msg_type),
    };
    if !matches {
        return Ok(None);
    }

    if let Some(err) = envelope.error {
        warn!(code = %err.code, "Deriv rejected {}: {}", msg_type, err.message);
        return Err(BrokerError::Rejected { code: err.code, message: err.message });
    }

    match envelope.msg_type.as_deref() {
        Some(t) if t == msg_type => Ok(Some(value)),
        other => Err(BrokerError::UnexpectedResponse(format!(
            "expected `{}` reply, got `{}`",
            msg_type,
            other.unwrap_or("<none>")
        ))),
    }
}
