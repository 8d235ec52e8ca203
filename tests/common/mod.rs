//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use signal_relay::bybit::messages::{
    ApiResponse, CancelAllResult, CoinBalance, InstrumentInfo, LotSizeFilter, OrderIdResult, PositionEntry,
    WalletAccount,
};
use signal_relay::common::types::{Category, OrderRequest};
use signal_relay::config::types::TradingConfig;
use signal_relay::{ExchangeApi, Notifier, RelayError, Result};
use rust_decimal_macros::dec;

/// In-memory exchange with canned responses
pub struct FakeExchange {
    pub instruments: Vec<InstrumentInfo>,
    pub positions: Vec<PositionEntry>,
    pub wallet: Vec<WalletAccount>,
    pub wallet_fails: bool,
    pub submit_code: i64,
    pub submit_message: String,
    pub leverage_code: i64,
    pub submitted: Mutex<Vec<OrderRequest>>,
}

impl Default for FakeExchange {
    fn default() -> Self {
        Self {
            instruments: vec![instrument("BTCUSDT", "0.001")],
            positions: Vec::new(),
            wallet: vec![wallet("10000")],
            wallet_fails: false,
            submit_code: 0,
            submit_message: "OK".to_string(),
            leverage_code: 0,
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl FakeExchange {
    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn envelope<T>(code: i64, message: &str, result: T) -> ApiResponse<T> {
        ApiResponse {
            ret_code: code,
            ret_msg: message.to_string(),
            result: Some(result),
            time: Some(1_704_067_200_000),
        }
    }
}

#[async_trait]
impl ExchangeApi for FakeExchange {
    async fn instruments_info(&self, _category: Category, symbol: &str) -> Result<Vec<InstrumentInfo>> {
        Ok(self
            .instruments
            .iter()
            .filter(|i| i.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn wallet_balance(&self, _account_type: &str, _coin: Option<&str>) -> Result<Vec<WalletAccount>> {
        if self.wallet_fails {
            return Err(RelayError::upstream(10006, "Too many visits"));
        }
        Ok(self.wallet.clone())
    }

    async fn position_list(&self, _category: Category, symbol: &str) -> Result<Vec<PositionEntry>> {
        Ok(self
            .positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<ApiResponse<OrderIdResult>> {
        self.submitted.lock().unwrap().push(order.clone());
        Ok(Self::envelope(
            self.submit_code,
            &self.submit_message,
            OrderIdResult {
                order_id: "1321003749386327552".to_string(),
                order_link_id: String::new(),
            },
        ))
    }

    async fn cancel_order(
        &self,
        _category: Category,
        _symbol: &str,
        order_id: &str,
    ) -> Result<ApiResponse<OrderIdResult>> {
        Ok(Self::envelope(
            0,
            "OK",
            OrderIdResult {
                order_id: order_id.to_string(),
                order_link_id: String::new(),
            },
        ))
    }

    async fn cancel_all_orders(&self, _category: Category, _symbol: &str) -> Result<ApiResponse<CancelAllResult>> {
        Ok(Self::envelope(0, "OK", CancelAllResult::default()))
    }

    async fn set_leverage(
        &self,
        _category: Category,
        _symbol: &str,
        _buy_leverage: &str,
        _sell_leverage: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        Ok(Self::envelope(
            self.leverage_code,
            if self.leverage_code == 0 { "OK" } else { "leverage invalid" },
            serde_json::json!({}),
        ))
    }

    fn exchange_name(&self) -> &'static str {
        "fake"
    }
}

/// Notifier that keeps every message
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Notifier whose chat transport is always down
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_text(&self, _text: &str) -> Result<()> {
        Err(RelayError::upstream(502, "Bad Gateway"))
    }
}

pub fn instrument(symbol: &str, min_order_qty: &str) -> InstrumentInfo {
    InstrumentInfo {
        symbol: symbol.to_string(),
        status: "Trading".to_string(),
        lot_size_filter: LotSizeFilter {
            min_order_qty: min_order_qty.to_string(),
            max_order_qty: "100".to_string(),
            qty_step: min_order_qty.to_string(),
        },
    }
}

pub fn wallet(equity: &str) -> WalletAccount {
    WalletAccount {
        account_type: "UNIFIED".to_string(),
        total_equity: equity.to_string(),
        coin: vec![CoinBalance {
            coin: "USDT".to_string(),
            equity: equity.to_string(),
            wallet_balance: equity.to_string(),
            usd_value: equity.to_string(),
            ..Default::default()
        }],
    }
}

pub fn position(symbol: &str, side: &str, size: &str) -> PositionEntry {
    PositionEntry {
        symbol: symbol.to_string(),
        side: side.to_string(),
        size: size.to_string(),
        mark_price: "100".to_string(),
        ..Default::default()
    }
}

/// Settings used across pipeline tests: 1% risk, 10x leverage
pub fn trading_config() -> TradingConfig {
    TradingConfig {
        risk_percentage: dec!(0.01),
        leverage: dec!(10),
        account_type: "UNIFIED".to_string(),
        base_coin: "USDT".to_string(),
        category: Category::Linear,
        take_profit_pct: dec!(0.02),
        stop_loss_pct: dec!(0.01),
    }
}

/// Sample webhook bodies
pub mod webhooks {
    pub const BUY_BTC: &str = r#"{"action":"buy","ticker":"BTCUSDT","close":"50000","interval":"15"}"#;
    pub const MISSING_TICKER: &str = r#"{"action":"buy","close":"50000","interval":"15"}"#;
}
