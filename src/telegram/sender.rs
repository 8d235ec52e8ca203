//! Outbound Telegram messages

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::common::errors::{RelayError, Result};
use crate::common::traits::Notifier;
use crate::config::types::TelegramConfig;

/// Telegram rejects messages longer than this many characters
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        Self::with_timeout(config, Duration::from_secs(30))
    }

    pub fn with_timeout(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// URL of a Bot API method
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Send text to any chat, optionally with a parse mode
    pub async fn send_message(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let mut params = serde_json::json!({
            "chat_id": chat_id,
            "text": truncate(text),
            "disable_web_page_preview": true,
        });
        if let Some(mode) = parse_mode {
            params["parse_mode"] = serde_json::Value::from(mode);
        }

        debug!(chat_id, "sending Telegram message");

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reply: Option<ApiReply> = serde_json::from_str(&body).ok();

        match reply {
            Some(reply) if status.is_success() && reply.ok => Ok(()),
            Some(reply) => {
                let code = reply.error_code.unwrap_or(i64::from(status.as_u16()));
                let description = reply.description.unwrap_or_else(|| body.clone());
                error!(code, %description, "Telegram sendMessage failed");
                Err(RelayError::upstream(code, description))
            }
            None => {
                error!(%status, %body, "Telegram sendMessage returned an unexpected body");
                Err(RelayError::InvalidResponse(format!("HTTP {}: {}", status, body)))
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.send_message(&self.chat_id, text, None).await
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    cut.push('…');
    cut
}
