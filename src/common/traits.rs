//! Trait definitions for the exchange and chat seams

use async_trait::async_trait;

use super::errors::Result;
use super::types::{Category, OrderRequest};
use crate::bybit::messages::{
    ApiResponse, CancelAllResult, InstrumentInfo, OrderIdResult, PositionEntry, WalletAccount,
};

/// Exchange REST operations used by the gateways
///
/// Query methods fail with `RelayError::Upstream` on a non-zero return code.
/// Order methods hand back the raw envelope so the Order Gateway can
/// normalize the return code itself.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Instrument metadata for a symbol (public endpoint)
    async fn instruments_info(&self, category: Category, symbol: &str) -> Result<Vec<InstrumentInfo>>;

    /// Wallet accounts for an account type, optionally filtered by coin
    async fn wallet_balance(&self, account_type: &str, coin: Option<&str>) -> Result<Vec<WalletAccount>>;

    /// Open position rows for a symbol
    async fn position_list(&self, category: Category, symbol: &str) -> Result<Vec<PositionEntry>>;

    /// Place an order
    async fn submit_order(&self, order: &OrderRequest) -> Result<ApiResponse<OrderIdResult>>;

    /// Cancel one order by id
    async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> Result<ApiResponse<OrderIdResult>>;

    /// Cancel every open order for a symbol
    async fn cancel_all_orders(&self, category: Category, symbol: &str) -> Result<ApiResponse<CancelAllResult>>;

    /// Set buy/sell leverage for a symbol
    async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        buy_leverage: &str,
        sell_leverage: &str,
    ) -> Result<ApiResponse<serde_json::Value>>;

    /// Name of the exchange, for log lines
    fn exchange_name(&self) -> &'static str;
}

/// Sends text to the configured chat
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
}
