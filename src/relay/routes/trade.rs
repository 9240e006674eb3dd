// src/relay/routes/trade.rs

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::models::{TradeRequest, TradeUpdate};
use crate::relay::error::ApiError;
use crate::relay::state::AppState;
use crate::storage;

/// `POST /trade`: serial key check, presence check, one order relayed to the broker.
pub async fn execute_trade(
    State(state): State<AppState>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let serial_key = request.serial_key.as_deref().unwrap_or_default();
    if !state.config.is_valid_serial_key(serial_key) {
        warn!("Trade rejected: invalid serial key");
        return Err(ApiError::InvalidSerialKey);
    }

    let order = request
        .to_order()
        .ok_or_else(|| ApiError::BadRequest("All fields are required.".into()))?;

    match state.broker.place_order(&order).await {
        Ok(receipt) => {
            info!(symbol = %order.symbol, contract_id = ?receipt.contract_id, "Trade filled");
            if let Err(e) = storage::insert_filled_trade(&state.db, &order, &receipt).await {
                error!("Failed to journal filled trade: {:#}", e);
            }
            state.publish(TradeUpdate::trade(receipt.raw.clone()));
            Ok(Json(receipt.raw))
        }
        Err(e) => {
            warn!(symbol = %order.symbol, "Trade failed: {}", e);
            if let Err(db_err) = storage::insert_failed_trade(&state.db, &order, &e.to_string()).await {
                error!("Failed to journal failed trade: {:#}", db_err);
            }
            Err(e.into())
        }
    }
}
