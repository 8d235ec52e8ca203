//! REST API client for Bybit v5

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::auth::generate_auth_headers;
use super::messages::*;
use crate::common::errors::{RelayError, Result};
use crate::common::traits::ExchangeApi;
use crate::common::types::{Category, OrderRequest};
use crate::config::types::{ApiCredentials, BybitConfig};

const DEFAULT_RECV_WINDOW: u64 = 5000;

/// REST API client for Bybit v5
#[derive(Debug, Clone)]
pub struct BybitRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the v5 API
    base_url: String,
    /// Credentials for private endpoints
    credentials: Option<ApiCredentials>,
    /// Receive window for signed requests
    recv_window: u64,
}

impl BybitRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            recv_window: DEFAULT_RECV_WINDOW,
        })
    }

    /// Build a signed client from configuration
    pub fn from_config(config: &BybitConfig, timeout: Duration) -> Result<Self> {
        Ok(Self::with_timeout(&config.base_url(), timeout)?
            .with_credentials(config.credentials())
            .with_recv_window(config.recv_window_ms))
    }

    /// Set API credentials for private endpoints
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    fn credentials(&self) -> Result<&ApiCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| RelayError::Authentication("API credentials are not configured".to_string()))
    }

    /// Unsigned GET against a public endpoint
    async fn public_get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse<T>> {
        let query_string = encode_query(query);
        let url = format!("{}{}?{}", self.base_url, path, query_string);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_envelope(response).await
    }

    /// Signed GET against a private endpoint
    async fn signed_get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse<T>> {
        let creds = self.credentials()?;
        let query_string = encode_query(query);
        let url = format!("{}{}?{}", self.base_url, path, query_string);
        debug!("GET {}", url);

        let headers = generate_auth_headers(&creds.api_key, &creds.api_secret, self.recv_window, &query_string)?;
        let response = headers.apply_to_request(self.client.get(&url)).send().await?;
        Self::read_envelope(response).await
    }

    /// Signed POST with a JSON body
    async fn signed_post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let creds = self.credentials()?;
        let payload = serde_json::to_string(body)?;
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} {}", url, payload);

        let headers = generate_auth_headers(&creds.api_key, &creds.api_secret, self.recv_window, &payload)?;
        let response = headers
            .apply_to_request(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<ApiResponse<T>> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Unwrap the result of a query call, turning non-zero codes into errors
    fn into_result<T: Default>(envelope: ApiResponse<T>, what: &str) -> Result<T> {
        if !envelope.is_ok() {
            warn!(code = envelope.ret_code, message = %envelope.ret_msg, "{} failed", what);
            return Err(RelayError::upstream(envelope.ret_code, envelope.ret_msg));
        }
        Ok(envelope.result.unwrap_or_default())
    }
}

#[async_trait]
impl ExchangeApi for BybitRestClient {
    #[instrument(skip(self))]
    async fn instruments_info(&self, category: Category, symbol: &str) -> Result<Vec<InstrumentInfo>> {
        let envelope: ApiResponse<InstrumentsResult> = self
            .public_get(
                "/v5/market/instruments-info",
                &[("category", category.as_str()), ("symbol", symbol)],
            )
            .await?;
        Ok(Self::into_result(envelope, "instruments info")?.list)
    }

    #[instrument(skip(self))]
    async fn wallet_balance(&self, account_type: &str, coin: Option<&str>) -> Result<Vec<WalletAccount>> {
        let mut query = vec![("accountType", account_type)];
        if let Some(coin) = coin {
            query.push(("coin", coin));
        }
        let envelope: ApiResponse<WalletBalanceResult> =
            self.signed_get("/v5/account/wallet-balance", &query).await?;
        Ok(Self::into_result(envelope, "wallet balance")?.list)
    }

    #[instrument(skip(self))]
    async fn position_list(&self, category: Category, symbol: &str) -> Result<Vec<PositionEntry>> {
        let envelope: ApiResponse<PositionListResult> = self
            .signed_get(
                "/v5/position/list",
                &[("category", category.as_str()), ("symbol", symbol)],
            )
            .await?;
        Ok(Self::into_result(envelope, "position list")?.list)
    }

    #[instrument(skip(self))]
    async fn submit_order(&self, order: &OrderRequest) -> Result<ApiResponse<OrderIdResult>> {
        self.signed_post("/v5/order/create", order).await
    }

    #[instrument(skip(self))]
    async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> Result<ApiResponse<OrderIdResult>> {
        let body = CancelOrderBody {
            category: category.as_str(),
            symbol,
            order_id,
        };
        self.signed_post("/v5/order/cancel", &body).await
    }

    #[instrument(skip(self))]
    async fn cancel_all_orders(&self, category: Category, symbol: &str) -> Result<ApiResponse<CancelAllResult>> {
        let body = CancelAllBody {
            category: category.as_str(),
            symbol,
        };
        self.signed_post("/v5/order/cancel-all", &body).await
    }

    #[instrument(skip(self))]
    async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        buy_leverage: &str,
        sell_leverage: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let body = SetLeverageBody {
            category: category.as_str(),
            symbol,
            buy_leverage,
            sell_leverage,
        };
        self.signed_post("/v5/position/set-leverage", &body).await
    }

    fn exchange_name(&self) -> &'static str {
        "bybit"
    }
}

/// Encode query pairs in the order given; the signature covers this exact string
fn encode_query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BybitRestClient::new("https://api.bybit.com");
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_normalization() {
        let client = BybitRestClient::new("https://api.bybit.com/").unwrap();
        assert!(!client.base_url.ends_with('/'));
    }

    #[test]
    fn test_encode_query_keeps_order() {
        let query = encode_query(&[("category", "linear"), ("symbol", "BTCUSDT")]);
        assert_eq!(query, "category=linear&symbol=BTCUSDT");
    }

    #[tokio::test]
    async fn test_private_call_without_credentials_fails() {
        let client = BybitRestClient::new("http://127.0.0.1:9").unwrap();
        let result = client.position_list(Category::Linear, "BTCUSDT").await;
        assert!(matches!(result, Err(RelayError::Authentication(_))));
    }
}
