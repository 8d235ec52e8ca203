//! Domain types shared by the gateways, the pipeline and the chat surface

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::RelayError;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(RelayError::Validation(format!(
                "Invalid side '{}', expected Buy or Sell",
                other
            ))),
        }
    }
}

/// Exchange market type classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
    Linear,
    Inverse,
    Option,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spot => "spot",
            Category::Linear => "linear",
            Category::Inverse => "inverse",
            Category::Option => "option",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Ok(Category::Spot),
            "linear" => Ok(Category::Linear),
            "inverse" => Ok(Category::Inverse),
            "option" => Ok(Category::Option),
            other => Err(RelayError::Validation(format!(
                "Invalid category '{}', expected spot, linear, inverse or option",
                other
            ))),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(RelayError::Validation(format!(
                "Invalid order type '{}', expected Market or Limit",
                other
            ))),
        }
    }
}

/// A trading alert received from the webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub action: Side,
    pub symbol: String,
    pub price: Decimal,
    pub interval: String,
}

/// Sizing constraints for an instrument
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub name: String,
    pub min_order_size: Decimal,
}

/// Snapshot of an open position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub size: Decimal,
    pub mark_price: Decimal,
}

/// Snapshot of a single coin balance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletBalance {
    pub coin: String,
    pub equity: Decimal,
    pub available_to_withdraw: Option<Decimal>,
    pub wallet_balance: Option<Decimal>,
    pub usd_value: Option<Decimal>,
}

/// Order as sent to the exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub category: Category,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Quantity already formatted to the instrument's precision
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<String>,
}

impl OrderRequest {
    pub fn market(category: Category, symbol: impl Into<String>, side: Side, qty: impl Into<String>) -> Self {
        Self {
            category,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty: qty.into(),
            price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.order_type = OrderType::Limit;
        self.price = Some(price.into());
        self
    }

    pub fn with_tpsl(mut self, take_profit: impl Into<String>, stop_loss: impl Into<String>) -> Self {
        self.take_profit = Some(take_profit.into());
        self.stop_loss = Some(stop_loss.into());
        self
    }
}

/// Uniform result of an order, cancel or leverage call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl OrderOutcome {
    pub fn ok(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
