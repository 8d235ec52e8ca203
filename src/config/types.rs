//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{RelayError, Result};
use crate::common::types::Category;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot configuration
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Bybit exchange configuration
    #[serde(default)]
    pub bybit: BybitConfig,
    /// Position sizing and risk settings
    #[serde(default)]
    pub trading: TradingConfig,
    /// Webhook server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Check that every required value is present
    ///
    /// All problems are reported at once so a misconfigured deployment
    /// can be fixed in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if self.telegram.bot_token.trim().is_empty() {
            missing.push("bot token");
        }
        if self.telegram.chat_id.trim().is_empty() {
            missing.push("chat id");
        }
        if self.bybit.api_key.trim().is_empty() {
            missing.push("bybit api key");
        }
        if self.bybit.api_secret.trim().is_empty() {
            missing.push("bybit api secret");
        }
        if self.trading.risk_percentage <= Decimal::ZERO {
            missing.push("risk percentage");
        }
        if self.trading.leverage <= Decimal::ZERO {
            missing.push("leverage");
        }
        if self.trading.account_type.trim().is_empty() {
            missing.push("account type");
        }
        if self.trading.base_coin.trim().is_empty() {
            missing.push("base coin");
        }
        if self.server.port == 0 {
            missing.push("port");
        }
        if self.server.rate_limit_max == 0 || self.server.rate_limit_window_secs == 0 {
            missing.push("rate limit");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RelayError::Configuration(format!(
                "missing or invalid values: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Telegram bot configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Token issued by @BotFather
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives signal and order notifications
    #[serde(default)]
    pub chat_id: String,
    /// User ids allowed to issue commands (defaults to the chat id)
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

impl TelegramConfig {
    /// Allow-list for incoming commands
    pub fn authorized_ids(&self) -> Vec<i64> {
        if !self.allowed_user_ids.is_empty() {
            return self.allowed_user_ids.clone();
        }
        self.chat_id.trim().parse().map(|id| vec![id]).unwrap_or_default()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            allowed_user_ids: Vec::new(),
            api_url: default_telegram_api_url(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("allowed_user_ids", &self.allowed_user_ids)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Bybit exchange configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BybitConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Use the testnet host when no explicit URL is given
    #[serde(default)]
    pub testnet: bool,
    /// Base URL for the v5 REST API
    #[serde(default)]
    pub rest_url: Option<String>,
    /// Receive window for signed requests in milliseconds
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

impl BybitConfig {
    /// Effective REST base URL
    pub fn base_url(&self) -> String {
        match &self.rest_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ if self.testnet => "https://api-testnet.bybit.com".to_string(),
            _ => "https://api.bybit.com".to_string(),
        }
    }

    pub fn credentials(&self) -> ApiCredentials {
        ApiCredentials::new(self.api_key.clone(), self.api_secret.clone())
    }
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            testnet: false,
            rest_url: None,
            recv_window_ms: default_recv_window(),
        }
    }
}

impl std::fmt::Debug for BybitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("testnet", &self.testnet)
            .field("rest_url", &self.rest_url)
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}

fn default_recv_window() -> u64 {
    5000
}

/// Position sizing and risk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Fraction of equity risked per signal (0.01 = 1%)
    #[serde(default)]
    pub risk_percentage: Decimal,
    /// Leverage multiplier applied to the sized quantity
    #[serde(default)]
    pub leverage: Decimal,
    /// Wallet account type used for equity lookups (e.g. UNIFIED)
    #[serde(default)]
    pub account_type: String,
    /// Coin whose equity drives sizing (e.g. USDT)
    #[serde(default)]
    pub base_coin: String,
    /// Market category signals trade in
    #[serde(default = "default_category")]
    pub category: Category,
    /// Take-profit distance as a fraction of entry
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Decimal,
    /// Stop-loss distance as a fraction of entry
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            risk_percentage: Decimal::ZERO,
            leverage: Decimal::ZERO,
            account_type: String::new(),
            base_coin: String::new(),
            category: default_category(),
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
        }
    }
}

fn default_category() -> Category {
    Category::Linear
}

fn default_take_profit_pct() -> Decimal {
    dec!(0.02)
}

fn default_stop_loss_pct() -> Decimal {
    dec!(0.01)
}

/// Webhook server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests each client may make per window
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    /// Length of the rate-limit window in seconds
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window(),
        }
    }
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_rate_limit_window() -> u64 {
    15 * 60
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// API credentials for signed requests
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self { api_key, api_secret }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.telegram.bot_token = "123:abc".into();
        config.telegram.chat_id = "42".into();
        config.bybit.api_key = "key".into();
        config.bybit.api_secret = "secret".into();
        config.trading.risk_percentage = dec!(0.01);
        config.trading.leverage = dec!(5);
        config.trading.account_type = "UNIFIED".into();
        config.trading.base_coin = "USDT".into();
        config
    }

    #[test]
    fn test_complete_config_validates() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_all_missing_values() {
        let mut config = complete_config();
        config.telegram.bot_token.clear();
        config.trading.leverage = Decimal::ZERO;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("bot token"));
        assert!(err.contains("leverage"));
        assert!(!err.contains("chat id"));
    }

    #[test]
    fn test_authorized_ids_default_to_chat_id() {
        let mut telegram = TelegramConfig::default();
        telegram.chat_id = "42".into();
        assert_eq!(telegram.authorized_ids(), vec![42]);

        telegram.allowed_user_ids = vec![7, 8];
        assert_eq!(telegram.authorized_ids(), vec![7, 8]);
    }

    #[test]
    fn test_bybit_base_url() {
        let mut bybit = BybitConfig::default();
        assert_eq!(bybit.base_url(), "https://api.bybit.com");
        bybit.testnet = true;
        assert_eq!(bybit.base_url(), "https://api-testnet.bybit.com");
        bybit.rest_url = Some("http://127.0.0.1:9000".into());
        assert_eq!(bybit.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = complete_config();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("123:abc"));
    }
}
