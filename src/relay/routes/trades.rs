// src/relay/routes/trades.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::relay::error::ApiError;
use crate::relay::state::AppState;
use crate::storage::{self, TradeRecord};

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    pub limit: Option<u32>,
}

/// `GET /trades`: journal, newest first.
pub async fn recent_trades(
    State(state): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> Result<Json<Vec<TradeRecord>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(storage::list_recent_trades(&state.db, limit).await?))
}
