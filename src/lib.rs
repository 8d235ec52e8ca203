//! Signal Relay Library
//!
//! Receives TradingView alerts over HTTP, relays them to a Telegram chat and
//! turns them into Bybit orders. A Telegram bot on the same chat answers
//! balance, position and manual order commands.

pub mod bybit;
pub mod common;
pub mod config;
pub mod server;
pub mod telegram;
pub mod trading;

// Re-export commonly used types
pub use bybit::BybitRestClient;
pub use common::errors::{ErrorKind, RelayError, Result};
pub use common::traits::{ExchangeApi, Notifier};
pub use common::types::{
    Category, OrderOutcome, OrderRequest, OrderType, Position, Side, SymbolInfo, TradingSignal, WalletBalance,
};
pub use config::types::AppConfig;
pub use server::{router, AppState};
pub use telegram::{CommandHandler, TelegramBot, TelegramNotifier};
pub use trading::{BalanceGateway, OrderGateway, PipelineReport, PositionInspector, SignalPipeline};
