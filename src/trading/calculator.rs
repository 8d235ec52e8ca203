//! Quantity and risk arithmetic
//!
//! Everything here is pure except [`symbol_info`], which performs the single
//! instrument metadata lookup the sizing rules depend on.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::bybit::messages::parse_decimal;
use crate::common::errors::{RelayError, Result};
use crate::common::traits::ExchangeApi;
use crate::common::types::{Category, Side, SymbolInfo};

/// Take-profit and stop-loss levels, rounded to two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TpSl {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

impl TpSl {
    pub fn take_profit_str(&self) -> String {
        format!("{:.2}", self.take_profit)
    }

    pub fn stop_loss_str(&self) -> String {
        format!("{:.2}", self.stop_loss)
    }
}

/// Look up the minimum order size for a symbol
///
/// Fails with `NotFound` when the exchange does not list the symbol.
pub async fn symbol_info(exchange: &dyn ExchangeApi, category: Category, symbol: &str) -> Result<SymbolInfo> {
    let instruments = exchange.instruments_info(category, symbol).await?;

    let instrument = instruments
        .into_iter()
        .find(|i| i.symbol.eq_ignore_ascii_case(symbol))
        .ok_or_else(|| RelayError::NotFound(format!("Symbol {} not found", symbol)))?;

    let min_order_size = parse_decimal(&instrument.lot_size_filter.min_order_qty)
        .filter(|min| *min > Decimal::ZERO)
        .ok_or_else(|| {
            RelayError::InvalidResponse(format!(
                "Invalid minimum order size '{}' for {}",
                instrument.lot_size_filter.min_order_qty, symbol
            ))
        })?;

    Ok(SymbolInfo {
        name: instrument.symbol,
        min_order_size,
    })
}

/// Number of digits after the decimal point in the value's canonical form
pub fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Flat percentage take-profit/stop-loss around an entry price
///
/// Fails with `Validation` when a level does not fit in a `Decimal`.
pub fn compute_tpsl(entry_price: Decimal, side: Side, tp_pct: Decimal, sl_pct: Decimal) -> Result<TpSl> {
    let (tp_factor, sl_factor) = match side {
        Side::Buy => (Decimal::ONE.checked_add(tp_pct), Decimal::ONE.checked_sub(sl_pct)),
        Side::Sell => (Decimal::ONE.checked_sub(tp_pct), Decimal::ONE.checked_add(sl_pct)),
    };

    let level = |factor: Option<Decimal>, name: &str| {
        factor
            .and_then(|f| entry_price.checked_mul(f))
            .map(round_price)
            .ok_or_else(|| out_of_range(name, entry_price))
    };

    Ok(TpSl {
        take_profit: level(tp_factor, "take-profit")?,
        stop_loss: level(sl_factor, "stop-loss")?,
    })
}

/// Size an order from equity and risk settings
///
/// `raw = equity * risk_pct / close_price * leverage`, floored at the
/// leveraged minimum order size and rounded to `precision` places.
/// A `flip_qty` replaces the risk-sized quantity entirely: reversing an
/// opposing position takes precedence over risk sizing.
pub fn size_order(
    equity: Decimal,
    risk_pct: Decimal,
    leverage: Decimal,
    close_price: Decimal,
    min_order_size: Decimal,
    precision: u32,
    flip_qty: Option<Decimal>,
) -> Result<String> {
    if let Some(flip) = flip_qty {
        return Ok(format_quantity(flip, precision));
    }

    if close_price <= Decimal::ZERO {
        return Err(RelayError::Validation(format!(
            "Close price must be positive, got {}",
            close_price
        )));
    }

    let raw = equity
        .checked_mul(risk_pct)
        .and_then(|v| v.checked_div(close_price))
        .and_then(|v| v.checked_mul(leverage))
        .ok_or_else(|| out_of_range("order quantity", close_price))?;
    // max() keeps the floor at or above the instrument minimum when leverage < 1
    let floor = min_order_size
        .checked_mul(leverage)
        .map(|leveraged| min_order_size.max(leveraged))
        .ok_or_else(|| out_of_range("minimum quantity", close_price))?;

    let mut qty = raw
        .max(floor)
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    if qty < floor {
        qty = floor.round_dp_with_strategy(precision, RoundingStrategy::AwayFromZero);
    }

    Ok(format_quantity(qty, precision))
}

fn out_of_range(what: &str, close_price: Decimal) -> RelayError {
    RelayError::Validation(format!(
        "Close price {} is out of range: {} overflows",
        close_price, what
    ))
}

/// Render a quantity with exactly `precision` decimal places
pub fn format_quantity(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", precision as usize, rounded)
}

fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(dec!(0.001)), 3);
        assert_eq!(decimal_places(dec!(5)), 0);
        assert_eq!(decimal_places(dec!(0.0100)), 2);
        assert_eq!(decimal_places(dec!(100.0)), 0);
    }

    #[test]
    fn test_tpsl_buy() {
        let levels = compute_tpsl(dec!(100), Side::Buy, dec!(0.02), dec!(0.01)).unwrap();
        assert_eq!(levels.take_profit_str(), "102.00");
        assert_eq!(levels.stop_loss_str(), "99.00");
    }

    #[test]
    fn test_tpsl_sell() {
        let levels = compute_tpsl(dec!(100), Side::Sell, dec!(0.02), dec!(0.01)).unwrap();
        assert_eq!(levels.take_profit_str(), "98.00");
        assert_eq!(levels.stop_loss_str(), "101.00");
    }

    #[test]
    fn test_tpsl_rounds_to_cents() {
        let levels = compute_tpsl(dec!(64123.456), Side::Buy, dec!(0.015), dec!(0.005)).unwrap();
        // 64123.456 * 1.015 = 65085.30784, 64123.456 * 0.995 = 63802.83872
        assert_eq!(levels.take_profit, dec!(65085.31));
        assert_eq!(levels.stop_loss, dec!(63802.84));
    }

    #[test]
    fn test_size_order_uses_risk_sizing() {
        // 10000 * 0.01 / 50000 * 5 = 0.01
        let qty = size_order(dec!(10000), dec!(0.01), dec!(5), dec!(50000), dec!(0.001), 3, None).unwrap();
        assert_eq!(qty, "0.010");
    }

    #[test]
    fn test_size_order_floors_at_leveraged_minimum() {
        // raw = 100 * 0.01 / 50000 * 2 = 0.00004, below the minimum
        let qty = size_order(dec!(100), dec!(0.01), dec!(2), dec!(50000), dec!(0.001), 3, None).unwrap();
        assert_eq!(qty, "0.002");
    }

    #[test]
    fn test_size_order_never_below_leveraged_minimum() {
        let cases = [
            (dec!(0), dec!(0.01), dec!(10), dec!(30000), dec!(0.001)),
            (dec!(1000), dec!(0.01), dec!(10), dec!(30000), dec!(0.001)),
            (dec!(250), dec!(0.05), dec!(3), dec!(1.2345), dec!(1)),
            (dec!(99999), dec!(0.5), dec!(1), dec!(0.08), dec!(10)),
            (dec!(500), dec!(0.02), dec!(2.5), dec!(2000), dec!(0.01)),
            (dec!(500), dec!(0.02), dec!(0.5), dec!(2000), dec!(0.01)),
        ];

        for (equity, risk, leverage, close, min) in cases {
            let precision = decimal_places(min);
            let qty: Decimal = size_order(equity, risk, leverage, close, min, precision, None)
                .unwrap()
                .parse()
                .unwrap();
            assert!(qty >= min * leverage, "{} < {} * {}", qty, min, leverage);
            assert!(qty >= min, "{} < min {}", qty, min);
            assert!(decimal_places(qty) <= precision);
        }
    }

    #[test]
    fn test_flip_overrides_risk_sizing() {
        let qty = size_order(dec!(1000000), dec!(0.5), dec!(20), dec!(1), dec!(1), 0, Some(dec!(20))).unwrap();
        assert_eq!(qty, "20");
    }

    #[test]
    fn test_zero_close_price_is_rejected() {
        let result = size_order(dec!(1000), dec!(0.01), dec!(5), dec!(0), dec!(0.001), 3, None);
        assert!(matches!(result, Err(RelayError::Validation(_))));
    }

    #[test]
    fn test_tiny_close_price_overflow_is_rejected() {
        let result = size_order(
            dec!(10000),
            dec!(0.01),
            dec!(10),
            dec!(0.0000000000000000000000000001),
            dec!(0.001),
            3,
            None,
        );
        assert!(matches!(result, Err(RelayError::Validation(ref m)) if m.contains("out of range")));
    }

    #[test]
    fn test_huge_close_price_tpsl_is_rejected() {
        let close = Decimal::MAX;
        let result = compute_tpsl(close, Side::Buy, dec!(0.02), dec!(0.01));
        assert!(matches!(result, Err(RelayError::Validation(_))));

        let result = compute_tpsl(close, Side::Sell, dec!(0.02), dec!(0.01));
        assert!(matches!(result, Err(RelayError::Validation(_))));
    }

    #[test]
    fn test_format_quantity_pads_to_precision() {
        assert_eq!(format_quantity(dec!(0.001), 3), "0.001");
        assert_eq!(format_quantity(dec!(0.1), 3), "0.100");
        assert_eq!(format_quantity(dec!(12), 0), "12");
    }
}
