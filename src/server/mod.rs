//! Server module - webhook and leverage HTTP API with per-client rate limiting

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use routes::router;
pub use state::AppState;
