// src/relay/routes/signal.rs

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::warn;

use crate::analysis::{signal, SignalReport};
use crate::models::{SignalRequest, TradeUpdate};
use crate::relay::error::ApiError;
use crate::relay::state::AppState;

/// `POST /api/trade`: indicator-based trade signal for a symbol.
pub async fn trade_signal(
    State(state): State<AppState>,
    body: Result<Json<SignalRequest>, JsonRejection>,
) -> Result<Json<SignalReport>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid input".into());
    let Json(request) = body.map_err(|_| invalid())?;
    let symbol = request.validated_symbol().ok_or_else(invalid)?;

    let decision = signal::decide(state.broker.as_ref(), &symbol, state.config.candle_count)
        .await
        .inspect_err(|e| warn!(symbol = %symbol, "Signal analysis failed: {:#}", e))?;
    let report = SignalReport::new(&symbol, &decision, request.stop_loss_percent, request.take_profit_percent);

    match serde_json::to_value(&report) {
        Ok(value) => state.publish(TradeUpdate::signal(value)),
        Err(e) => warn!("Signal report not broadcast: {}", e),
    }
    Ok(Json(report))
}
