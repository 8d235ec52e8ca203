//! Request signing for the Bybit v5 private API

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{RelayError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Generate the HMAC-SHA256 signature for a v5 request
///
/// # Arguments
/// * `secret` - API secret
/// * `timestamp_ms` - Unix timestamp in milliseconds
/// * `api_key` - API key
/// * `recv_window` - Receive window in milliseconds
/// * `payload` - Query string for GET, JSON body for POST
pub fn sign_request(
    secret: &str,
    timestamp_ms: i64,
    api_key: &str,
    recv_window: u64,
    payload: &str,
) -> Result<String> {
    let message = format!("{}{}{}{}", timestamp_ms, api_key, recv_window, payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Generate authentication headers for a request
pub fn generate_auth_headers(
    api_key: &str,
    api_secret: &str,
    recv_window: u64,
    payload: &str,
) -> Result<AuthHeaders> {
    let timestamp_ms = chrono::Utc::now().timestamp_millis();
    let signature = sign_request(api_secret, timestamp_ms, api_key, recv_window, payload)?;

    Ok(AuthHeaders {
        api_key: api_key.to_string(),
        signature,
        timestamp_ms,
        recv_window,
    })
}

/// Authentication headers for a signed request
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp_ms: i64,
    pub recv_window: u64,
}

impl AuthHeaders {
    /// Add authentication headers to a reqwest RequestBuilder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-SIGN", &self.signature)
            .header("X-BAPI-SIGN-TYPE", "2")
            .header("X-BAPI-TIMESTAMP", self.timestamp_ms.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window.to_string())
    }
}
