//! Shared state for the webhook server

use std::sync::Arc;

use super::rate_limit::{RateLimitConfig, RateLimiter};
use crate::common::traits::ExchangeApi;
use crate::common::types::Category;
use crate::trading::SignalPipeline;

pub struct AppState {
    pub pipeline: SignalPipeline,
    pub exchange: Arc<dyn ExchangeApi>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(pipeline: SignalPipeline, exchange: Arc<dyn ExchangeApi>, rate_limit: RateLimitConfig) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            exchange,
            limiter: RateLimiter::new(rate_limit),
        })
    }

    /// Category used for requests that do not name one
    pub fn category(&self) -> Category {
        self.pipeline.settings().category
    }
}
