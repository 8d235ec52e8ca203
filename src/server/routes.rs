//! HTTP routes
//!
//! `POST /api/tradingview` is the signal webhook. The body is taken as raw
//! bytes so malformed JSON gets the same 400 envelope as a missing field.

use axum::body::Bytes;
use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::error::ApiError;
use super::rate_limit::rate_limit_middleware;
use super::state::AppState;
use crate::common::errors::RelayError;
use crate::trading::{OrderGateway, SignalPipeline};

pub const WEBHOOK_RECEIVED: &str = "TradingView Webhook received";

/// Build the application router; every route is rate limited per client
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/tradingview", post(tradingview_webhook))
        .route("/api/leverage", post(set_leverage))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> &'static str {
    "Signal relay is running"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn tradingview_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let signal = SignalPipeline::parse_signal(&body).map_err(|e| {
        warn!(error = %e, "rejected webhook body");
        ApiError::new("Invalid webhook payload", e)
    })?;

    let report = state
        .pipeline
        .process(signal)
        .await
        .map_err(|e| ApiError::new("Error processing TradingView Webhook", e))?;

    info!(
        symbol = %report.order.symbol,
        qty = %report.order.qty,
        success = report.outcome.success,
        "webhook processed"
    );

    Ok(Json(json!({
        "message": WEBHOOK_RECEIVED,
        "success": true,
        "data": {
            "signal": report.signal,
            "order": report.outcome,
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverageBody {
    symbol: Option<String>,
    buy_leverage: Option<Value>,
    sell_leverage: Option<Value>,
}

async fn set_leverage(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let invalid = |e: RelayError| ApiError::new("Missing required parameters", e);

    let body: LeverageBody = serde_json::from_slice(&body)
        .map_err(|e| invalid(RelayError::Validation(format!("Malformed request body: {}", e))))?;

    let symbol = body
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    let buy = body.buy_leverage.as_ref().and_then(leverage_text);
    let sell = body.sell_leverage.as_ref().and_then(leverage_text);

    let (Some(symbol), Some(buy), Some(sell)) = (symbol, buy, sell) else {
        return Err(invalid(RelayError::Validation(
            "symbol, buyLeverage and sellLeverage are required".to_string(),
        )));
    };

    let outcome = OrderGateway::new(state.exchange.as_ref())
        .set_leverage(state.category(), &symbol, &buy, &sell)
        .await;

    if outcome.success {
        Ok(Json(json!({
            "message": outcome.message,
            "success": true,
            "data": outcome.data,
        })))
    } else {
        Err(ApiError::new(
            "Error setting leverage",
            RelayError::Internal(outcome.message),
        ))
    }
}

/// Leverage may arrive as `"5"` or `5`
fn leverage_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
