// src/relay/routes/mod.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::path::Path;

use crate::relay::state::AppState;

pub mod analyze;
pub mod signal;
pub mod trade;
pub mod trades;

/// `GET /`: the frontend when it is deployed next to the binary.
pub async fn index(State(state): State<AppState>) -> Response {
    let page = Path::new(&state.config.static_dir).join("index.html");
    match tokio::fs::read_to_string(&page).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => "Welcome to the Trading API".into_response(),
    }
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
