//! Balance Gateway

use rust_decimal::Decimal;
use tracing::warn;

use crate::bybit::messages::{parse_decimal, CoinBalance, WalletAccount};
use crate::common::errors::Result;
use crate::common::traits::ExchangeApi;
use crate::common::types::WalletBalance;

/// Reads account equity used for sizing decisions
pub struct BalanceGateway<'a> {
    exchange: &'a dyn ExchangeApi,
}

impl<'a> BalanceGateway<'a> {
    pub fn new(exchange: &'a dyn ExchangeApi) -> Self {
        Self { exchange }
    }

    /// Equity of the first coin of the first account, or `None` on any failure
    ///
    /// Only the first coin counts; an unparseable first coin is `None` rather
    /// than falling through to a later coin. Callers treat `None` as "size at
    /// the instrument minimum".
    pub async fn get_equity(&self, account_type: &str, coin: Option<&str>) -> Option<Decimal> {
        match self.exchange.wallet_balance(account_type, coin).await {
            Ok(accounts) => {
                let equity = first_coin_equity(&accounts);
                if equity.is_none() {
                    warn!(account_type, ?coin, "wallet balance has no usable first coin");
                }
                equity
            }
            Err(e) => {
                warn!(account_type, ?coin, error = %e, "wallet balance lookup failed");
                None
            }
        }
    }

    /// All coin balances of the first account, skipping unparseable rows
    pub async fn get_balances(&self, account_type: &str, coin: Option<&str>) -> Result<Vec<WalletBalance>> {
        let accounts = self.exchange.wallet_balance(account_type, coin).await?;

        Ok(accounts
            .into_iter()
            .next()
            .map(|account| account.coin.iter().filter_map(to_wallet_balance).collect())
            .unwrap_or_default())
    }
}

fn first_coin_equity(accounts: &[WalletAccount]) -> Option<Decimal> {
    let coin = accounts.first()?.coin.first()?;
    parse_decimal(&coin.equity)
}

fn to_wallet_balance(coin: &CoinBalance) -> Option<WalletBalance> {
    Some(WalletBalance {
        coin: coin.coin.clone(),
        equity: parse_decimal(&coin.equity)?,
        available_to_withdraw: parse_decimal(&coin.available_to_withdraw),
        wallet_balance: parse_decimal(&coin.wallet_balance),
        usd_value: parse_decimal(&coin.usd_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_coin_without_equity_is_skipped() {
        let coin = CoinBalance {
            coin: "USDT".into(),
            equity: "".into(),
            ..Default::default()
        };
        assert!(to_wallet_balance(&coin).is_none());
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let coin = CoinBalance {
            coin: "USDT".into(),
            equity: "1250.75".into(),
            wallet_balance: "1200".into(),
            available_to_withdraw: "".into(),
            ..Default::default()
        };
        let balance = to_wallet_balance(&coin).unwrap();
        assert_eq!(balance.equity, dec!(1250.75));
        assert_eq!(balance.wallet_balance, Some(dec!(1200)));
        assert_eq!(balance.available_to_withdraw, None);
    }

    fn coin(name: &str, equity: &str) -> CoinBalance {
        CoinBalance {
            coin: name.to_string(),
            equity: equity.to_string(),
            ..Default::default()
        }
    }

    fn account(coins: Vec<CoinBalance>) -> WalletAccount {
        WalletAccount {
            account_type: "UNIFIED".to_string(),
            coin: coins,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_coin_equity() {
        let accounts = vec![account(vec![coin("USDT", "1500.25"), coin("BTC", "0.5")])];
        assert_eq!(first_coin_equity(&accounts), Some(dec!(1500.25)));
    }

    #[test]
    fn test_unparseable_first_coin_does_not_fall_through() {
        let accounts = vec![account(vec![coin("USDT", ""), coin("BTC", "500")])];
        assert_eq!(first_coin_equity(&accounts), None);
    }

    #[test]
    fn test_no_accounts_or_coins() {
        assert_eq!(first_coin_equity(&[]), None);
        assert_eq!(first_coin_equity(&[account(vec![])]), None);
    }
}
