//! Signal Pipeline
//!
//! Turns one webhook signal into at most one order. Each run reads position,
//! balance and instrument data fresh from the exchange; nothing is kept
//! between signals.
//!
//! ```text
//! signal ──► relay to chat (best effort)
//!        ──► instrument min size / precision
//!        ──► opposing position → flip qty
//!        ──► equity (absent → min size)
//!        ──► qty, TP/SL
//!        ──► submit order
//!        ──► relay outcome (best effort)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::balance::BalanceGateway;
use super::calculator::{compute_tpsl, decimal_places, format_quantity, size_order, symbol_info, TpSl};
use super::orders::OrderGateway;
use super::position::{flip_quantity, PositionInspector};
use crate::common::errors::{RelayError, Result};
use crate::common::traits::{ExchangeApi, Notifier};
use crate::common::types::{OrderOutcome, OrderRequest, Side, TradingSignal};
use crate::config::types::TradingConfig;
use crate::telegram::format::{format_order_result, format_pipeline_error, format_signal};

/// Raw webhook body as sent by TradingView
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    action: Option<String>,
    ticker: Option<String>,
    close: Option<serde_json::Value>,
    interval: Option<serde_json::Value>,
}

/// Everything decided and observed while handling one signal
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub signal: TradingSignal,
    pub order: OrderRequest,
    pub levels: TpSl,
    /// Whether the quantity reverses an opposing position
    pub flipped: bool,
    /// Whether sizing fell back to the minimum because equity was unavailable
    pub equity_fallback: bool,
    pub outcome: OrderOutcome,
}

/// Orchestrates one signal from receipt to order outcome
pub struct SignalPipeline {
    exchange: Arc<dyn ExchangeApi>,
    notifier: Arc<dyn Notifier>,
    settings: TradingConfig,
}

impl SignalPipeline {
    pub fn new(exchange: Arc<dyn ExchangeApi>, notifier: Arc<dyn Notifier>, settings: TradingConfig) -> Self {
        Self {
            exchange,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &TradingConfig {
        &self.settings
    }

    /// Parse and validate a webhook body
    ///
    /// Any missing or malformed field is a `Validation` error.
    pub fn parse_signal(body: &[u8]) -> Result<TradingSignal> {
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| RelayError::Validation(format!("Malformed webhook body: {}", e)))?;

        let mut missing = Vec::new();
        if payload.action.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("action");
        }
        if payload.ticker.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("ticker");
        }
        if payload.close.as_ref().map_or(true, |v| v.is_null()) {
            missing.push("close");
        }
        if payload.interval.as_ref().map_or(true, |v| v.is_null()) {
            missing.push("interval");
        }
        if !missing.is_empty() {
            return Err(RelayError::Validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        let action: Side = payload.action.unwrap_or_default().parse()?;
        let symbol = payload.ticker.unwrap_or_default().trim().to_uppercase();
        let close = payload.close.unwrap_or_default();
        let price = json_decimal(&close)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| RelayError::Validation(format!("Invalid close price: {}", close)))?;
        let interval = match payload.interval.unwrap_or_default() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(TradingSignal {
            action,
            symbol,
            price,
            interval,
        })
    }

    /// Handle one signal end to end
    ///
    /// Chat relays are best effort and never affect the result. An error is
    /// returned only when the order could not be prepared; a rejected order
    /// is a successful run with a failed outcome.
    #[instrument(skip(self), fields(symbol = %signal.symbol, action = %signal.action))]
    pub async fn process(&self, signal: TradingSignal) -> Result<PipelineReport> {
        info!(
            exchange = self.exchange.exchange_name(),
            price = %signal.price,
            interval = %signal.interval,
            "processing signal"
        );
        self.relay(&format_signal(&signal)).await;

        match self.execute(&signal).await {
            Ok(report) => {
                self.relay(&format_order_result(&report.order, &report.outcome, report.flipped))
                    .await;
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "signal processing failed");
                self.relay(&format_pipeline_error(&signal, &e)).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, signal: &TradingSignal) -> Result<PipelineReport> {
        let exchange = self.exchange.as_ref();
        let settings = &self.settings;

        let info = symbol_info(exchange, settings.category, &signal.symbol).await?;
        let precision = decimal_places(info.min_order_size);

        let position = PositionInspector::new(exchange, settings.category)
            .get_position(&signal.symbol)
            .await?;
        let flip_qty = flip_quantity(position.as_ref(), signal.action);
        if let (Some(position), Some(qty)) = (&position, flip_qty) {
            info!(current_side = %position.side, current_size = %position.size, %qty, "flipping opposing position");
        }

        let coin = Some(settings.base_coin.as_str()).filter(|c| !c.is_empty());
        let equity = BalanceGateway::new(exchange)
            .get_equity(&settings.account_type, coin)
            .await;

        let qty = match (equity, flip_qty) {
            (Some(equity), _) => size_order(
                equity,
                settings.risk_percentage,
                settings.leverage,
                signal.price,
                info.min_order_size,
                precision,
                flip_qty,
            )?,
            (None, Some(flip)) => format_quantity(flip, precision),
            (None, None) => {
                warn!("equity unavailable, sizing at instrument minimum");
                format_quantity(info.min_order_size, precision)
            }
        };

        let levels = compute_tpsl(
            signal.price,
            signal.action,
            settings.take_profit_pct,
            settings.stop_loss_pct,
        )?;

        let order = OrderRequest::market(settings.category, &info.name, signal.action, qty)
            .with_tpsl(levels.take_profit_str(), levels.stop_loss_str());
        let outcome = OrderGateway::new(exchange).submit_order(&order).await;

        Ok(PipelineReport {
            signal: signal.clone(),
            order,
            levels,
            flipped: flip_qty.is_some(),
            equity_fallback: equity.is_none(),
            outcome,
        })
    }

    async fn relay(&self, text: &str) {
        if let Err(e) = self.notifier.send_text(text).await {
            warn!(error = %e, "chat relay failed");
        }
    }
}

fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
