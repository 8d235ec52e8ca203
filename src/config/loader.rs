//! Configuration loader

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::Path;

use super::types::{AppConfig, AppSettings, BybitConfig, ServerConfig, TelegramConfig, TradingConfig};
use crate::common::errors::{RelayError, Result};
use crate::common::types::Category;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with RELAY__, sections split by `__`)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("RELAY")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("telegram.allowed_user_ids")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| RelayError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| RelayError::Configuration(e.to_string()))
}

/// Load configuration from flat environment variables only
///
/// A `.env` file is not read here; the binary loads it before parsing
/// arguments.
pub fn load_from_env() -> Result<AppConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from any key lookup
///
/// Split out from [`load_from_env`] so parsing can be exercised without
/// touching the process environment.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let telegram = TelegramConfig {
        bot_token: get("BOT_TOKEN").unwrap_or_default(),
        chat_id: get("CHAT_ID").unwrap_or_default(),
        allowed_user_ids: match get("WHITELISTED_USERS") {
            Some(list) => parse_id_list(&list)?,
            None => Vec::new(),
        },
        api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| TelegramConfig::default().api_url),
    };

    let bybit = BybitConfig {
        api_key: get("BYBIT_API_KEY").unwrap_or_default(),
        api_secret: get("BYBIT_API_SECRET").unwrap_or_default(),
        testnet: get("BYBIT_TESTNET")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false),
        rest_url: get("BYBIT_REST_URL"),
        recv_window_ms: parse_opt("BYBIT_RECV_WINDOW", get("BYBIT_RECV_WINDOW"))?
            .unwrap_or_else(|| BybitConfig::default().recv_window_ms),
    };

    let defaults = TradingConfig::default();
    let trading = TradingConfig {
        risk_percentage: parse_opt::<Decimal>("RISK_PERCENTAGE", get("RISK_PERCENTAGE"))?
            .unwrap_or(Decimal::ZERO),
        leverage: parse_opt::<Decimal>("LEVERAGE", get("LEVERAGE"))?.unwrap_or(Decimal::ZERO),
        account_type: get("ACCOUNT_TYPE").unwrap_or_default(),
        base_coin: get("BASE_COIN").unwrap_or_default(),
        category: match get("CATEGORY") {
            Some(raw) => raw
                .parse::<Category>()
                .map_err(|e| RelayError::Configuration(e.to_string()))?,
            None => defaults.category,
        },
        take_profit_pct: parse_opt("TAKE_PROFIT_PCT", get("TAKE_PROFIT_PCT"))?
            .unwrap_or(defaults.take_profit_pct),
        stop_loss_pct: parse_opt("STOP_LOSS_PCT", get("STOP_LOSS_PCT"))?
            .unwrap_or(defaults.stop_loss_pct),
    };

    let server_defaults = ServerConfig::default();
    let server = ServerConfig {
        host: get("HOST").unwrap_or(server_defaults.host),
        port: parse_opt("PORT", get("PORT"))?.unwrap_or(server_defaults.port),
        rate_limit_max: parse_opt("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"))?
            .unwrap_or(server_defaults.rate_limit_max),
        rate_limit_window_secs: parse_opt("RATE_LIMIT_WINDOW_SECS", get("RATE_LIMIT_WINDOW_SECS"))?
            .unwrap_or(server_defaults.rate_limit_window_secs),
    };

    let settings_defaults = AppSettings::default();
    let settings = AppSettings {
        request_timeout_seconds: parse_opt("REQUEST_TIMEOUT_SECONDS", get("REQUEST_TIMEOUT_SECONDS"))?
            .unwrap_or(settings_defaults.request_timeout_seconds),
    };

    Ok(AppConfig {
        telegram,
        bybit,
        trading,
        server,
        settings,
    })
}

fn parse_opt<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| RelayError::Configuration(format!("{} has invalid value '{}': {}", key, raw, e)))
        })
        .transpose()
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|id| {
            id.parse::<i64>()
                .map_err(|e| RelayError::Configuration(format!("WHITELISTED_USERS entry '{}': {}", id, e)))
        })
        .collect()
}
