//! Position Inspector

use rust_decimal::Decimal;
use tracing::debug;

use crate::bybit::messages::{parse_decimal, PositionEntry};
use crate::common::errors::Result;
use crate::common::traits::ExchangeApi;
use crate::common::types::{Category, Position, Side};

/// Reads the current open position for a symbol
pub struct PositionInspector<'a> {
    exchange: &'a dyn ExchangeApi,
    category: Category,
}

impl<'a> PositionInspector<'a> {
    pub fn new(exchange: &'a dyn ExchangeApi, category: Category) -> Self {
        Self { exchange, category }
    }

    /// Fetch the open position, or `None` when flat
    ///
    /// Only transport/API failures are errors; "no position" is not.
    pub async fn get_position(&self, symbol: &str) -> Result<Option<Position>> {
        let entries = self.exchange.position_list(self.category, symbol).await?;
        let position = entries.iter().find_map(to_position);

        debug!(symbol, ?position, "position lookup");
        Ok(position)
    }

    /// Fetch every open position row for a symbol
    pub async fn get_positions(&self, symbol: &str) -> Result<Vec<Position>> {
        let entries = self.exchange.position_list(self.category, symbol).await?;
        Ok(entries.iter().filter_map(to_position).collect())
    }
}

/// Quantity that closes an opposing position and opens the same size the other way
///
/// Returns `None` when there is no position or it is already on `signal_side`.
pub fn flip_quantity(position: Option<&Position>, signal_side: Side) -> Option<Decimal> {
    position
        .filter(|p| p.side != signal_side && p.size > Decimal::ZERO)
        .and_then(|p| p.size.checked_mul(Decimal::TWO))
}

/// Bybit reports a placeholder row with an empty side when flat
fn to_position(entry: &PositionEntry) -> Option<Position> {
    let side = entry.side.parse::<Side>().ok()?;
    let size = parse_decimal(&entry.size).filter(|s| *s > Decimal::ZERO)?;

    Some(Position {
        symbol: entry.symbol.clone(),
        side,
        size,
        mark_price: parse_decimal(&entry.mark_price).unwrap_or(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(side: &str, size: &str) -> PositionEntry {
        PositionEntry {
            symbol: "BTCUSDT".to_string(),
            side: side.to_string(),
            size: size.to_string(),
            mark_price: "50000.5".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_placeholder_is_absent() {
        assert!(to_position(&entry("", "0")).is_none());
        assert!(to_position(&entry("Buy", "0")).is_none());
    }

    #[test]
    fn test_open_entry_is_parsed() {
        let position = to_position(&entry("Sell", "0.25")).unwrap();
        assert_eq!(position.side, Side::Sell);
        assert_eq!(position.size, dec!(0.25));
        assert_eq!(position.mark_price, dec!(50000.5));
    }

    #[test]
    fn test_flip_quantity() {
        let short = Position {
            symbol: "BTCUSDT".into(),
            side: Side::Sell,
            size: dec!(10),
            mark_price: dec!(1),
        };

        assert_eq!(flip_quantity(Some(&short), Side::Buy), Some(dec!(20)));
        assert_eq!(flip_quantity(Some(&short), Side::Sell), None);
        assert_eq!(flip_quantity(None, Side::Buy), None);
    }
}
