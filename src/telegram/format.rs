//! Human-readable chat messages

use crate::common::errors::RelayError;
use crate::common::types::{OrderOutcome, OrderRequest, Position, TradingSignal, WalletBalance};

const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '$', '<', '\\',
];

/// Escape text for Telegram's MarkdownV2 parse mode
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Notification for a freshly received signal
pub fn format_signal(signal: &TradingSignal) -> String {
    format!(
        "📡 TradingView signal received\n\n\
         Action: {}\n\
         Symbol: {}\n\
         Price: {}\n\
         Interval: {}",
        signal.action.as_str().to_uppercase(),
        signal.symbol,
        signal.price,
        signal.interval
    )
}

/// Notification for the order a signal produced
pub fn format_order_result(order: &OrderRequest, outcome: &OrderOutcome, flipped: bool) -> String {
    let status = if outcome.success { "✅ Order placed" } else { "❌ Order failed" };
    let mut lines = vec![
        status.to_string(),
        String::new(),
        format!("Symbol: {}", order.symbol),
        format!("Side: {}", order.side),
        format!("Type: {}", order.order_type),
        format!("Qty: {}{}", order.qty, if flipped { " (position flip)" } else { "" }),
    ];
    if let Some(tp) = &order.take_profit {
        lines.push(format!("Take profit: {}", tp));
    }
    if let Some(sl) = &order.stop_loss {
        lines.push(format!("Stop loss: {}", sl));
    }
    lines.push(String::new());
    lines.push(outcome.message.clone());
    lines.join("\n")
}

/// Notification for a signal that failed before an order could be sent
pub fn format_pipeline_error(signal: &TradingSignal, err: &RelayError) -> String {
    format!(
        "🚨 Error processing {} signal for {}\n\n{}",
        signal.action.as_str().to_uppercase(),
        signal.symbol,
        err
    )
}

/// Summary of coin balances for the balance command
pub fn format_wallet_balance(account_type: &str, balances: &[WalletBalance]) -> String {
    if balances.is_empty() {
        return format!("No balances found for {} account", account_type);
    }

    let mut out = format!("💰 {} wallet balance\n", account_type);
    for balance in balances {
        out.push_str(&format!("\n{}\n  Equity: {}\n", balance.coin, balance.equity));
        if let Some(wallet) = balance.wallet_balance {
            out.push_str(&format!("  Wallet balance: {}\n", wallet));
        }
        if let Some(available) = balance.available_to_withdraw {
            out.push_str(&format!("  Available to withdraw: {}\n", available));
        }
        if let Some(usd) = balance.usd_value {
            out.push_str(&format!("  USD value: {}\n", usd));
        }
    }
    out.trim_end().to_string()
}

/// Summary of open positions for the position command
pub fn format_positions(symbol: &str, positions: &[Position]) -> String {
    if positions.is_empty() {
        return format!("No open position for {}", symbol);
    }

    let mut out = String::from("📊 Open positions\n");
    for p in positions {
        out.push_str(&format!(
            "\n{}\n  Side: {}\n  Size: {}\n  Mark price: {}\n",
            p.symbol, p.side, p.size, p.mark_price
        ));
    }
    out.trim_end().to_string()
}
