// src/relay/routes/analyze.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::time::Duration;

use crate::analysis::{run_script, summarize, HistoricalSummary};
use crate::exchange::types::Timeframe;
use crate::relay::error::ApiError;
use crate::relay::state::AppState;

const MAX_HISTORY_COUNT: u32 = 5000;

/// `GET /analyze`: stdout of the configured analysis script.
pub async fn analyze(State(state): State<AppState>) -> Response {
    let limit = Duration::from_secs(state.config.analyze_timeout_secs);
    match run_script(&state.config.analyze_command, limit).await {
        Ok(stdout) => stdout.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub count: Option<u32>,
}

/// `GET /analyze/historical-data`
pub async fn historical_data(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoricalSummary>, ApiError> {
    let symbol = query
        .symbol
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.config.history_symbol.clone());
    let timeframe = match query.timeframe.as_deref() {
        Some(tf) => tf.parse::<Timeframe>().map_err(ApiError::BadRequest)?,
        None => Timeframe::D1,
    };
    let count = query.count.unwrap_or(state.config.history_count).clamp(1, MAX_HISTORY_COUNT);

    let candles = state.broker.candles(&symbol, timeframe, count).await?;
    Ok(Json(summarize(&symbol, timeframe, &candles)))
}
