//! Integration tests for chat command replies against an in-memory exchange

mod common;

use common::FakeExchange;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use signal_relay::common::types::{Category, OrderType, Side};
use signal_relay::CommandHandler;

fn handler(exchange: &Arc<FakeExchange>) -> CommandHandler {
    CommandHandler::new(exchange.clone())
}

#[test_log::test(tokio::test)]
async fn test_limit_order_carries_type_and_price() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/order linear btcusdt Buy Limit 0.01 65000", None)
        .await;

    assert_eq!(reply.text, "Order submitted successfully. Order ID: 1321003749386327552");
    assert_eq!(reply.parse_mode, None);

    let submitted = exchange.submitted();
    assert_eq!(submitted.len(), 1);
    let order = &submitted[0];
    assert_eq!(order.category, Category::Linear);
    assert_eq!(order.symbol, "BTCUSDT");
    assert_eq!(order.side, Side::Buy);
    assert_eq!(order.order_type, OrderType::Limit);
    assert_eq!(order.qty, "0.01");
    assert_eq!(order.price.as_deref(), Some("65000"));

    let wire = serde_json::to_value(order).unwrap();
    assert_eq!(wire["orderType"], "Limit");
    assert_eq!(wire["price"], "65000");
}

#[test_log::test(tokio::test)]
async fn test_market_order_has_no_price() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/order linear BTCUSDT Sell Market 0.5", None)
        .await;

    assert!(reply.text.starts_with("Order submitted successfully"));
    let submitted = exchange.submitted();
    assert_eq!(submitted[0].order_type, OrderType::Market);
    assert_eq!(submitted[0].side, Side::Sell);
    assert_eq!(submitted[0].price, None);
    assert!(serde_json::to_value(&submitted[0]).unwrap().get("price").is_none());
}

#[test_log::test(tokio::test)]
async fn test_rejected_order_reply() {
    let exchange = Arc::new(FakeExchange {
        submit_code: 110007,
        submit_message: "ab not enough for new order".to_string(),
        ..Default::default()
    });

    let reply = handler(&exchange)
        .handle_text("/order linear BTCUSDT Buy Market 1", None)
        .await;

    assert_eq!(reply.text, "Insufficient balance to place this order");
}

#[test_log::test(tokio::test)]
async fn test_cancel_order_reply() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/cancelorder linear BTCUSDT 123", None)
        .await;

    assert_eq!(reply.text, "Order 123 cancelled successfully");
    assert!(exchange.submitted().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_cancel_all_orders_reply() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/cancelallorders linear btcusdt", None)
        .await;

    assert_eq!(reply.text, "Cancelled 0 order(s) for BTCUSDT");
}

#[test_log::test(tokio::test)]
async fn test_balance_reply() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange).handle_text("/balance unified usdt", None).await;

    assert!(reply.text.starts_with("💰 UNIFIED wallet balance"));
    assert!(reply.text.contains("USDT\n  Equity: 10000"));
    assert!(reply.text.contains("Wallet balance: 10000"));
}

#[test_log::test(tokio::test)]
async fn test_balance_lookup_failure_reply() {
    let exchange = Arc::new(FakeExchange {
        wallet_fails: true,
        ..Default::default()
    });

    let reply = handler(&exchange).handle_text("/balance UNIFIED USDT", None).await;

    assert!(reply.text.starts_with("Error fetching wallet balance, try again."));
}

#[test_log::test(tokio::test)]
async fn test_wrong_argument_count_replies_with_usage() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/cancelorder linear BTCUSDT", None)
        .await;

    assert!(reply.text.starts_with("Invalid command format. Usage: /cancelorder"));
    assert!(!reply.text.contains("Validation error"));
    assert_eq!(reply.parse_mode, None);
    assert!(exchange.submitted().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_limit_without_price_replies_with_usage() {
    let exchange = Arc::new(FakeExchange::default());

    let reply = handler(&exchange)
        .handle_text("/order linear BTCUSDT Buy Limit 0.01", None)
        .await;

    assert!(reply.text.starts_with("Limit orders need a price. Usage: /order"));
    assert!(exchange.submitted().is_empty());
}
