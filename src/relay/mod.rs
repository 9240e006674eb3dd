// src/relay/mod.rs

//! HTTP surface: trade relay, signal analysis, journal, update socket and the
//! static frontend.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Response, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub mod broadcast;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let limiter = RateLimiter::new(
        Duration::from_secs(state.config.rate_limit_window_secs),
        state.config.rate_limit_max_requests,
    );
    router_with_limiter(state, limiter)
}

pub fn router_with_limiter(state: AppState, limiter: RateLimiter) -> Router {
    // The fallback keeps unknown /api paths inside the limited router.
    let api = Router::new()
        .route("/trade", post(routes::signal::trade_signal))
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(limiter, rate_limit::rate_limit_middleware));

    let frontend = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(routes::not_found.into_service());

    Router::new()
        .route("/", get(routes::index))
        .route("/trade", post(routes::trade::execute_trade))
        .route("/trade/execute", post(routes::trade::execute_trade))
        .route("/analyze", get(routes::analyze::analyze))
        .route("/analyze/historical-data", get(routes::analyze::historical_data))
        .route("/trades", get(routes::trades::recent_trades))
        .route("/ws", get(broadcast::websocket_handler))
        .nest("/api", api)
        .fallback_service(frontend)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    let mut response = Response::new(Body::from("Something broke!"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Binds and serves until Ctrl+C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.socket_addr()?;
    let limiter = RateLimiter::new(
        Duration::from_secs(state.config.rate_limit_window_secs),
        state.config.rate_limit_max_requests,
    );
    limiter.spawn_cleanup();
    let app = router_with_limiter(state, limiter);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panicking_handler_becomes_500() {
        let app = Router::new().route("/boom", get(boom)).layer(CatchPanicLayer::custom(handle_panic));
        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Something broke!");
    }

    #[test]
    fn panic_payload_of_any_type_is_handled() {
        let response = handle_panic(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
