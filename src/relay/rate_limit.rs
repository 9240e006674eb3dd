// src/relay/rate_limit.rs

//! Fixed-window request limit per client IP.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self { window, max_requests, windows: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(ip).or_insert(Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            RateLimitResult::Allowed
        } else {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            RateLimitResult::Limited { retry_after: remaining.as_secs_f64().ceil().max(1.0) as u64 }
        }
    }

    /// Drops windows that have already expired.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        debug!(tracked = windows.len(), "Rate limiter cleanup");
    }

    pub async fn tracked_ips(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Periodic cleanup for the life of the process.
    pub fn spawn_cleanup(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            loop {
                ticker.tick().await;
                limiter.cleanup().await;
            }
        });
    }
}

pub async fn rate_limit_middleware(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);
    match limiter.check(ip).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            warn!(client_ip = %ip, retry_after, "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "errors": "Too many requests, please try again later." })),
            )
                .into_response();
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// Peer address from the connection, unspecified when the server was built
/// without connect info (tests).
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test(start_paused = true)]
    async fn limit_applies_per_window() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 2);
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Allowed);
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Allowed);
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Limited { retry_after: 900 });

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Limited { retry_after: 300 });

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert_eq!(limiter.check(ip(1)).await, RateLimitResult::Allowed);
        assert_eq!(limiter.check(ip(2)).await, RateLimitResult::Allowed);
        assert!(matches!(limiter.check(ip(1)).await, RateLimitResult::Limited { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_forgets_expired_windows() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 5);
        limiter.check(ip(1)).await;
        limiter.check(ip(2)).await;
        assert_eq!(limiter.tracked_ips().await, 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check(ip(3)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_ips().await, 1);
    }
}
