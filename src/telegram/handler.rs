//! Chat command execution
//!
//! Every command ends in readable text; exchange failures never escape as
//! errors.

use std::sync::Arc;
use tracing::{error, info};

use super::commands::{
    BotCommand, BALANCE_USAGE, CANCEL_ALL_USAGE, CANCEL_ORDER_USAGE, LEVERAGE_USAGE, ORDER_USAGE, POSITION_USAGE,
};
use super::format::{escape_markdown_v2, format_positions, format_wallet_balance};
use crate::common::errors::RelayError;
use crate::common::traits::ExchangeApi;
use crate::common::types::OrderRequest;
use crate::trading::{BalanceGateway, OrderGateway, PositionInspector};

/// Reply text plus the parse mode it was written for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
    pub parse_mode: Option<&'static str>,
}

impl CommandReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some("MarkdownV2"),
        }
    }
}

/// Runs chat commands against the exchange
pub struct CommandHandler {
    exchange: Arc<dyn ExchangeApi>,
}

impl CommandHandler {
    pub fn new(exchange: Arc<dyn ExchangeApi>) -> Self {
        Self { exchange }
    }

    /// Parse and run a message, always producing a reply
    pub async fn handle_text(&self, text: &str, first_name: Option<&str>) -> CommandReply {
        match BotCommand::parse(text) {
            Ok(command) => self.execute(command, first_name).await,
            Err(RelayError::Validation(message)) => CommandReply::plain(message),
            Err(e) => CommandReply::plain(e.to_string()),
        }
    }

    pub async fn execute(&self, command: BotCommand, first_name: Option<&str>) -> CommandReply {
        let exchange = self.exchange.as_ref();

        match command {
            BotCommand::Start => CommandReply::markdown(format!(
                "Hello {}\\! *Welcome to the signal relay bot*\n{}",
                escape_markdown_v2(first_name.unwrap_or("there")),
                escape_markdown_v2("/help to see available commands.")
            )),
            BotCommand::Help => CommandReply::markdown(help_text()),
            BotCommand::Balance { account_type, coin } => {
                match BalanceGateway::new(exchange)
                    .get_balances(&account_type, Some(&coin))
                    .await
                {
                    Ok(balances) => CommandReply::plain(format_wallet_balance(&account_type, &balances)),
                    Err(e) => {
                        error!(error = %e, "balance command failed");
                        CommandReply::plain(format!("Error fetching wallet balance, try again. ({})", e))
                    }
                }
            }
            BotCommand::Order {
                category,
                symbol,
                side,
                order_type,
                qty,
                price,
            } => {
                let mut order = OrderRequest::market(category, symbol, side, qty);
                if let Some(price) = price {
                    order = order.with_price(price);
                }
                order.order_type = order_type;
                info!(symbol = %order.symbol, side = %order.side, order_type = %order.order_type, "manual order from chat");
                let outcome = OrderGateway::new(exchange).submit_order(&order).await;
                CommandReply::plain(outcome.message)
            }
            BotCommand::CancelOrder {
                category,
                symbol,
                order_id,
            } => {
                let outcome = OrderGateway::new(exchange)
                    .cancel_order(category, &symbol, &order_id)
                    .await;
                CommandReply::plain(outcome.message)
            }
            BotCommand::CancelAllOrders { category, symbol } => {
                let outcome = OrderGateway::new(exchange)
                    .cancel_all_orders(category, &symbol)
                    .await;
                CommandReply::plain(outcome.message)
            }
            BotCommand::PositionInfo { category, symbol } => {
                match PositionInspector::new(exchange, category)
                    .get_positions(&symbol)
                    .await
                {
                    Ok(positions) => CommandReply::plain(format_positions(&symbol, &positions)),
                    Err(e) => {
                        error!(error = %e, "position command failed");
                        CommandReply::plain(format!("Error fetching position info, try again. ({})", e))
                    }
                }
            }
            BotCommand::Leverage {
                category,
                symbol,
                buy_leverage,
                sell_leverage,
            } => {
                let outcome = OrderGateway::new(exchange)
                    .set_leverage(category, &symbol, &buy_leverage, &sell_leverage)
                    .await;
                CommandReply::plain(outcome.message)
            }
            BotCommand::Unknown(_) => CommandReply::markdown(format!(
                "Hello {}\\! That was an unsupported command\\.\n{}",
                escape_markdown_v2(first_name.unwrap_or("there")),
                escape_markdown_v2("/help to see available commands.")
            )),
        }
    }
}

fn help_text() -> String {
    let lines = [
        "Available commands:",
        BALANCE_USAGE,
        ORDER_USAGE,
        CANCEL_ORDER_USAGE,
        CANCEL_ALL_USAGE,
        POSITION_USAGE,
        LEVERAGE_USAGE,
    ];
    format!(
        "*Welcome to the signal relay bot*\n{}",
        lines
            .iter()
            .map(|line| escape_markdown_v2(line))
            .collect::<Vec<_>>()
            .join("\n")
    )
}
