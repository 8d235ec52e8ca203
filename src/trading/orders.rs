//! Order Gateway
//!
//! Submits and cancels orders and folds the exchange's return codes into a
//! single [`OrderOutcome`]. Nothing in here returns an error: transport
//! failures become failed outcomes too.

use tracing::{error, info, warn};

use crate::bybit::messages::{ApiResponse, CancelAllResult, OrderIdResult};
use crate::common::errors::RelayError;
use crate::common::traits::ExchangeApi;
use crate::common::types::{Category, OrderOutcome, OrderRequest};

/// Bybit return codes with a dedicated message
pub mod codes {
    pub const OK: i64 = 0;
    pub const PARAMS_ERROR: i64 = 10001;
    pub const ORDER_NOT_EXISTS: i64 = 110001;
    pub const PRICE_OUT_OF_RANGE: i64 = 110003;
    pub const WALLET_INSUFFICIENT: i64 = 110004;
    pub const AB_NOT_ENOUGH: i64 = 110007;
    pub const AVAILABLE_INSUFFICIENT: i64 = 110012;
    pub const REDUCE_ONLY_QTY: i64 = 110017;
    pub const LEVERAGE_NOT_MODIFIED: i64 = 110043;
    pub const MARGIN_INSUFFICIENT: i64 = 110044;
    pub const BALANCE_INSUFFICIENT: i64 = 110045;
    pub const PRICE_TOO_FAR: i64 = 110094;
    pub const ORDER_NOT_EXISTS_SPOT: i64 = 170213;

    pub const INSUFFICIENT_BALANCE: &[i64] = &[
        WALLET_INSUFFICIENT,
        AB_NOT_ENOUGH,
        AVAILABLE_INSUFFICIENT,
        MARGIN_INSUFFICIENT,
        BALANCE_INSUFFICIENT,
    ];
    pub const INVALID_PRICE: &[i64] = &[PRICE_OUT_OF_RANGE, PRICE_TOO_FAR];
    pub const BAD_PARAMETERS: &[i64] = &[PARAMS_ERROR, REDUCE_ONLY_QTY];
    pub const UNKNOWN_ORDER: &[i64] = &[ORDER_NOT_EXISTS, ORDER_NOT_EXISTS_SPOT];
}

/// Places and cancels orders, never failing past this boundary
pub struct OrderGateway<'a> {
    exchange: &'a dyn ExchangeApi,
}

impl<'a> OrderGateway<'a> {
    pub fn new(exchange: &'a dyn ExchangeApi) -> Self {
        Self { exchange }
    }

    pub async fn submit_order(&self, order: &OrderRequest) -> OrderOutcome {
        info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = %order.qty,
            order_type = %order.order_type,
            "submitting order"
        );

        match self.exchange.submit_order(order).await {
            Ok(envelope) => {
                let outcome = normalize_submit(envelope);
                log_outcome("submit", &outcome);
                outcome
            }
            Err(e) => transport_failure("submitting order", e),
        }
    }

    pub async fn cancel_order(&self, category: Category, symbol: &str, order_id: &str) -> OrderOutcome {
        match self.exchange.cancel_order(category, symbol, order_id).await {
            Ok(envelope) => {
                let outcome = normalize_cancel(envelope, order_id);
                log_outcome("cancel", &outcome);
                outcome
            }
            Err(e) => transport_failure("cancelling order", e),
        }
    }

    pub async fn cancel_all_orders(&self, category: Category, symbol: &str) -> OrderOutcome {
        match self.exchange.cancel_all_orders(category, symbol).await {
            Ok(envelope) => {
                let outcome = normalize_cancel_all(envelope, symbol);
                log_outcome("cancel all", &outcome);
                outcome
            }
            Err(e) => transport_failure("cancelling all orders", e),
        }
    }

    pub async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        buy_leverage: &str,
        sell_leverage: &str,
    ) -> OrderOutcome {
        match self
            .exchange
            .set_leverage(category, symbol, buy_leverage, sell_leverage)
            .await
        {
            Ok(envelope) => {
                let outcome = normalize_leverage(envelope, symbol, buy_leverage, sell_leverage);
                log_outcome("set leverage", &outcome);
                outcome
            }
            Err(e) => transport_failure("setting leverage", e),
        }
    }
}

/// Map an order-create envelope to an outcome
pub fn normalize_submit(envelope: ApiResponse<OrderIdResult>) -> OrderOutcome {
    let code = envelope.ret_code;
    match code {
        codes::OK => {
            let result = envelope.result.unwrap_or_default();
            let message = format!("Order submitted successfully. Order ID: {}", result.order_id);
            OrderOutcome::ok(message, serde_json::to_value(&result).ok())
        }
        c if codes::INSUFFICIENT_BALANCE.contains(&c) => {
            OrderOutcome::failed("Insufficient balance to place this order")
        }
        c if codes::INVALID_PRICE.contains(&c) => {
            OrderOutcome::failed("Invalid order price: outside the range the exchange accepts")
        }
        c if codes::BAD_PARAMETERS.contains(&c) => OrderOutcome::failed(format!(
            "Invalid order parameters: {}",
            envelope.ret_msg
        )),
        _ => rejected(code, &envelope.ret_msg),
    }
}

/// Map an order-cancel envelope to an outcome
pub fn normalize_cancel(envelope: ApiResponse<OrderIdResult>, order_id: &str) -> OrderOutcome {
    match envelope.ret_code {
        codes::OK => {
            let result = envelope.result.unwrap_or_default();
            let message = format!("Order {} cancelled successfully", order_id);
            OrderOutcome::ok(message, serde_json::to_value(&result).ok())
        }
        c if codes::UNKNOWN_ORDER.contains(&c) => OrderOutcome::failed(format!(
            "Order {} does not exist or can no longer be cancelled",
            order_id
        )),
        c if codes::BAD_PARAMETERS.contains(&c) => OrderOutcome::failed(format!(
            "Invalid cancel parameters: {}",
            envelope.ret_msg
        )),
        c => rejected(c, &envelope.ret_msg),
    }
}

/// Map a cancel-all envelope to an outcome
pub fn normalize_cancel_all(envelope: ApiResponse<CancelAllResult>, symbol: &str) -> OrderOutcome {
    match envelope.ret_code {
        codes::OK => {
            let result = envelope.result.unwrap_or_default();
            let message = format!("Cancelled {} order(s) for {}", result.list.len(), symbol);
            OrderOutcome::ok(message, serde_json::to_value(&result).ok())
        }
        c if codes::BAD_PARAMETERS.contains(&c) => OrderOutcome::failed(format!(
            "Invalid cancel parameters: {}",
            envelope.ret_msg
        )),
        c => rejected(c, &envelope.ret_msg),
    }
}

/// Map a set-leverage envelope to an outcome; "not modified" counts as success
pub fn normalize_leverage(
    envelope: ApiResponse<serde_json::Value>,
    symbol: &str,
    buy_leverage: &str,
    sell_leverage: &str,
) -> OrderOutcome {
    match envelope.ret_code {
        codes::OK => OrderOutcome::ok(
            format!(
                "Leverage for {} set to {}x buy / {}x sell",
                symbol, buy_leverage, sell_leverage
            ),
            envelope.result,
        ),
        codes::LEVERAGE_NOT_MODIFIED => OrderOutcome::ok(
            format!("Leverage for {} is already {}x buy / {}x sell", symbol, buy_leverage, sell_leverage),
            None,
        ),
        c if codes::BAD_PARAMETERS.contains(&c) => OrderOutcome::failed(format!(
            "Invalid leverage parameters: {}",
            envelope.ret_msg
        )),
        c => rejected(c, &envelope.ret_msg),
    }
}

fn rejected(code: i64, ret_msg: &str) -> OrderOutcome {
    OrderOutcome::failed(format!("Exchange rejected the request (code {}): {}", code, ret_msg))
}

fn transport_failure(action: &str, err: RelayError) -> OrderOutcome {
    error!(error = %err, "error {}", action);
    OrderOutcome::failed(format!("Error {}: {}", action, err))
}

fn log_outcome(action: &str, outcome: &OrderOutcome) {
    if outcome.success {
        info!(message = %outcome.message, "{} succeeded", action);
    } else {
        warn!(message = %outcome.message, "{} failed", action);
    }
}
