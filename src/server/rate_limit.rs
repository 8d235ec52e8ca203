//! Per-client rate limiting
//!
//! Fixed window counter: each client gets `max_requests` per `window`, and
//! the count resets when the window expires.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::types::ServerConfig;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl From<&ServerConfig> for RateLimitConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_requests: config.rate_limit_max,
            window: Duration::from_secs(config.rate_limit_window_secs),
        }
    }
}

#[derive(Debug)]
struct ClientWindow {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    /// Seconds until the client's window resets
    Limited { retry_after: u64 },
}

/// Request counters keyed by client address
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<IpAddr, ClientWindow>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request from `ip`
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows.entry(ip).or_insert(ClientWindow { started: now, count: 0 });
        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        if window.count < self.config.max_requests {
            window.count += 1;
            RateLimitResult::Allowed
        } else {
            let remaining = self.config.window.saturating_sub(now.duration_since(window.started));
            RateLimitResult::Limited {
                retry_after: remaining.as_secs().max(1),
            }
        }
    }

    /// Drop windows that have already expired
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window;
        self.windows
            .write()
            .await
            .retain(|_, w| now.duration_since(w.started) < window);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Reject requests over the limit with 429 and the standard error envelope
pub async fn rate_limit_middleware(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);

    match limiter.check(ip).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            warn!(client_ip = %ip, retry_after, "rate limit exceeded");

            let body = json!({
                "message": RATE_LIMITED_MESSAGE,
                "success": false,
                "error": "Too Many Requests",
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// Client address from proxy headers, then the socket peer
fn client_ip(request: &Request) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
