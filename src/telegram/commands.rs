//! Chat command parsing
//!
//! Commands are space-delimited: `/order linear BTCUSDT Buy Market 0.01`.

use rust_decimal::Decimal;

use crate::common::errors::{RelayError, Result};
use crate::common::types::{Category, OrderType, Side};

pub const BALANCE_USAGE: &str = "/balance <accountType> <coin>. Example: /balance UNIFIED USDT";
pub const ORDER_USAGE: &str =
    "/order <category> <symbol> <side> <orderType> <qty> [price]. Example: /order linear BTCUSDT Buy Market 0.01";
pub const CANCEL_ORDER_USAGE: &str =
    "/cancelorder <category> <symbol> <orderId>. Example: /cancelorder linear BTCUSDT 1321003749386327552";
pub const CANCEL_ALL_USAGE: &str = "/cancelallorders <category> <symbol>. Example: /cancelallorders linear BTCUSDT";
pub const POSITION_USAGE: &str = "/positioninfo <category> <symbol>. Example: /positioninfo linear BTCUSDT";
pub const LEVERAGE_USAGE: &str =
    "/leverage <category> <symbol> <buyLeverage> <sellLeverage>. Example: /leverage linear BTCUSDT 5 5";

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Balance {
        account_type: String,
        coin: String,
    },
    Order {
        category: Category,
        symbol: String,
        side: Side,
        order_type: OrderType,
        qty: String,
        price: Option<String>,
    },
    CancelOrder {
        category: Category,
        symbol: String,
        order_id: String,
    },
    CancelAllOrders {
        category: Category,
        symbol: String,
    },
    PositionInfo {
        category: Category,
        symbol: String,
    },
    Leverage {
        category: Category,
        symbol: String,
        buy_leverage: String,
        sell_leverage: String,
    },
    /// Text that is not a supported command
    Unknown(String),
}

impl BotCommand {
    /// Parse message text into a command
    ///
    /// Wrong argument counts and unparseable arguments are `Validation`
    /// errors whose message carries the command's usage line.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let parts: Vec<&str> = text.split_whitespace().collect();

        let Some(first) = parts.first() else {
            return Ok(BotCommand::Unknown(String::new()));
        };
        let Some(word) = first.strip_prefix('/') else {
            return Ok(BotCommand::Unknown(text.to_string()));
        };
        // "/balance@my_bot" in group chats
        let word = word.split('@').next().unwrap_or_default().to_lowercase();
        let args = &parts[1..];

        match word.as_str() {
            "start" => Ok(BotCommand::Start),
            "help" => Ok(BotCommand::Help),
            "balance" => {
                expect_args(args, 2, BALANCE_USAGE)?;
                Ok(BotCommand::Balance {
                    account_type: args[0].to_uppercase(),
                    coin: args[1].to_uppercase(),
                })
            }
            "order" => {
                if args.len() != 5 && args.len() != 6 {
                    return Err(usage_error(ORDER_USAGE));
                }
                let order_type: OrderType = parse_arg(args[3], ORDER_USAGE)?;
                let price = args.get(5).map(|p| p.to_string());
                match (order_type, &price) {
                    (OrderType::Limit, None) => {
                        return Err(RelayError::Validation(format!(
                            "Limit orders need a price. Usage: {}",
                            ORDER_USAGE
                        )))
                    }
                    (OrderType::Market, Some(_)) => return Err(usage_error(ORDER_USAGE)),
                    _ => {}
                }
                if let Some(price) = &price {
                    positive_decimal(price, ORDER_USAGE)?;
                }
                Ok(BotCommand::Order {
                    category: parse_arg(args[0], ORDER_USAGE)?,
                    symbol: args[1].to_uppercase(),
                    side: parse_arg(args[2], ORDER_USAGE)?,
                    order_type,
                    qty: positive_decimal(args[4], ORDER_USAGE)?,
                    price,
                })
            }
            "cancelorder" => {
                expect_args(args, 3, CANCEL_ORDER_USAGE)?;
                Ok(BotCommand::CancelOrder {
                    category: parse_arg(args[0], CANCEL_ORDER_USAGE)?,
                    symbol: args[1].to_uppercase(),
                    order_id: args[2].to_string(),
                })
            }
            "cancelallorders" => {
                expect_args(args, 2, CANCEL_ALL_USAGE)?;
                Ok(BotCommand::CancelAllOrders {
                    category: parse_arg(args[0], CANCEL_ALL_USAGE)?,
                    symbol: args[1].to_uppercase(),
                })
            }
            "positioninfo" => {
                expect_args(args, 2, POSITION_USAGE)?;
                Ok(BotCommand::PositionInfo {
                    category: parse_arg(args[0], POSITION_USAGE)?,
                    symbol: args[1].to_uppercase(),
                })
            }
            "leverage" => {
                expect_args(args, 4, LEVERAGE_USAGE)?;
                Ok(BotCommand::Leverage {
                    category: parse_arg(args[0], LEVERAGE_USAGE)?,
                    symbol: args[1].to_uppercase(),
                    buy_leverage: positive_decimal(args[2], LEVERAGE_USAGE)?,
                    sell_leverage: positive_decimal(args[3], LEVERAGE_USAGE)?,
                })
            }
            _ => Ok(BotCommand::Unknown(text.to_string())),
        }
    }
}

fn usage_error(usage: &str) -> RelayError {
    RelayError::Validation(format!("Invalid command format. Usage: {}", usage))
}

fn expect_args(args: &[&str], count: usize, usage: &str) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(usage_error(usage))
    }
}

fn parse_arg<T>(raw: &str, usage: &str) -> Result<T>
where
    T: std::str::FromStr<Err = RelayError>,
{
    raw.parse::<T>().map_err(|e| match e {
        RelayError::Validation(reason) => RelayError::Validation(format!("{}. Usage: {}", reason, usage)),
        other => other,
    })
}

fn positive_decimal(raw: &str, usage: &str) -> Result<String> {
    match raw.parse::<Decimal>() {
        Ok(value) if value > Decimal::ZERO => Ok(raw.to_string()),
        _ => Err(RelayError::Validation(format!(
            "'{}' is not a positive number. Usage: {}",
            raw, usage
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_balance() {
        assert_eq!(
            BotCommand::parse("/balance unified usdt").unwrap(),
            BotCommand::Balance {
                account_type: "UNIFIED".into(),
                coin: "USDT".into()
            }
        );
    }

    #[test]
    fn test_parse_market_order() {
        assert_eq!(
            BotCommand::parse("/order linear btcusdt buy market 0.01").unwrap(),
            BotCommand::Order {
                category: Category::Linear,
                symbol: "BTCUSDT".into(),
                side: Side::Buy,
                order_type: OrderType::Market,
                qty: "0.01".into(),
                price: None,
            }
        );
    }

    #[test]
    fn test_parse_limit_order_requires_price() {
        let err = BotCommand::parse("/order linear BTCUSDT Sell Limit 0.01").unwrap_err();
        assert!(err.to_string().contains("need a price"));

        let command = BotCommand::parse("/order linear BTCUSDT Sell Limit 0.01 65000").unwrap();
        assert!(matches!(command, BotCommand::Order { price: Some(ref p), .. } if p == "65000"));
    }

    #[test]
    fn test_wrong_argument_count_returns_usage() {
        let err = BotCommand::parse("/cancelorder linear BTCUSDT").unwrap_err();
        assert!(matches!(err, RelayError::Validation(ref m) if m.contains(CANCEL_ORDER_USAGE)));

        let err = BotCommand::parse("/positioninfo").unwrap_err();
        assert!(err.to_string().contains(POSITION_USAGE));
    }

    #[test]
    fn test_bad_enum_argument_returns_usage() {
        let err = BotCommand::parse("/cancelallorders futures BTCUSDT").unwrap_err();
        assert!(err.to_string().contains("Invalid category"));
        assert!(err.to_string().contains(CANCEL_ALL_USAGE));

        let err = BotCommand::parse("/order linear BTCUSDT long Market 1").unwrap_err();
        assert!(err.to_string().contains("Invalid side"));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        assert!(BotCommand::parse("/order linear BTCUSDT Buy Market 0").is_err());
        assert!(BotCommand::parse("/order linear BTCUSDT Buy Market abc").is_err());
    }

    #[test]
    fn test_bot_suffix_and_case() {
        assert_eq!(BotCommand::parse("/HELP@relay_bot").unwrap(), BotCommand::Help);
        assert_eq!(BotCommand::parse("/start").unwrap(), BotCommand::Start);
    }

    #[test]
    fn test_unknown_text() {
        assert_eq!(
            BotCommand::parse("hello there").unwrap(),
            BotCommand::Unknown("hello there".into())
        );
        assert_eq!(
            BotCommand::parse("/moon").unwrap(),
            BotCommand::Unknown("/moon".into())
        );
    }

    #[test]
    fn test_parse_leverage() {
        assert_eq!(
            BotCommand::parse("/leverage linear ETHUSDT 10 5").unwrap(),
            BotCommand::Leverage {
                category: Category::Linear,
                symbol: "ETHUSDT".into(),
                buy_leverage: "10".into(),
                sell_leverage: "5".into(),
            }
        );
    }
}
