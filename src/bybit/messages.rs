//! Bybit v5 wire types
//!
//! Every endpoint answers with the same `{retCode, retMsg, result}` envelope.
//! Numeric values arrive as strings and may be empty.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response envelope shared by all v5 endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    /// Absent on some failures; a missing `Option` field decodes as `None`
    pub result: Option<T>,
    #[serde(default)]
    pub time: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.ret_code == 0
    }
}

/// Result of `GET /v5/market/instruments-info`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsResult {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<InstrumentInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub lot_size_filter: LotSizeFilter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    #[serde(default)]
    pub min_order_qty: String,
    #[serde(default)]
    pub max_order_qty: String,
    #[serde(default)]
    pub qty_step: String,
}

/// Result of `GET /v5/account/wallet-balance`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResult {
    #[serde(default)]
    pub list: Vec<WalletAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub total_equity: String,
    #[serde(default)]
    pub coin: Vec<CoinBalance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalance {
    pub coin: String,
    #[serde(default)]
    pub equity: String,
    #[serde(default)]
    pub wallet_balance: String,
    #[serde(default)]
    pub available_to_withdraw: String,
    #[serde(default)]
    pub usd_value: String,
    #[serde(default)]
    pub unrealised_pnl: String,
}

/// Result of `GET /v5/position/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionListResult {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<PositionEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    pub symbol: String,
    /// "Buy", "Sell", or empty when flat
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub mark_price: String,
    #[serde(default)]
    pub leverage: String,
    #[serde(default)]
    pub unrealised_pnl: String,
    #[serde(default)]
    pub take_profit: String,
    #[serde(default)]
    pub stop_loss: String,
}

/// Result of order create/cancel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdResult {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
}

/// Result of `POST /v5/order/cancel-all`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllResult {
    #[serde(default)]
    pub list: Vec<OrderIdResult>,
}

/// Body of `POST /v5/order/cancel`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderBody<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    pub order_id: &'a str,
}

/// Body of `POST /v5/order/cancel-all`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllBody<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
}

/// Body of `POST /v5/position/set-leverage`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageBody<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    pub buy_leverage: &'a str,
    pub sell_leverage: &'a str,
}

/// Parse an exchange numeric string; empty or malformed values are absent
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("0.001"), Some(dec!(0.001)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("  "), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_error_envelope_with_empty_result() {
        let json = r#"{"retCode":110007,"retMsg":"ab not enough for new order","result":{},"time":1700000000000}"#;
        let resp: ApiResponse<OrderIdResult> = serde_json::from_str(json).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.result.unwrap().order_id, "");
    }

    #[test]
    fn test_error_envelope_without_result() {
        let json = r#"{"retCode":10001,"retMsg":"params error"}"#;
        let resp: ApiResponse<InstrumentsResult> = serde_json::from_str(json).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.ret_msg, "params error");
        assert!(resp.result.is_none());
        assert!(resp.time.is_none());
    }

    #[test]
    fn test_instruments_parsing() {
        let json = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "linear",
                "list": [{
                    "symbol": "BTCUSDT",
                    "status": "Trading",
                    "lotSizeFilter": {"maxOrderQty": "100.000", "minOrderQty": "0.001", "qtyStep": "0.001"}
                }]
            }
        }"#;
        let resp: ApiResponse<InstrumentsResult> = serde_json::from_str(json).unwrap();
        let list = resp.result.unwrap().list;
        assert_eq!(list[0].lot_size_filter.min_order_qty, "0.001");
    }
}
