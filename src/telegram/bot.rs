//! Telegram bot loop
//!
//! Long-polls `getUpdates`, checks each sender against the allow-list and
//! answers commands through [`CommandHandler`].

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::handler::{CommandHandler, CommandReply};
use super::sender::TelegramNotifier;
use crate::common::errors::{RelayError, Result};

/// Seconds Telegram holds a `getUpdates` request open
const LONG_POLL_TIMEOUT_SECS: u64 = 30;
/// Pause after a failed poll
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub const UNAUTHORIZED_REPLY: &str = "You are not authorized to use this bot";

#[derive(Debug, Deserialize)]
struct TelegramUpdates {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// Command bot for the relay chat
pub struct TelegramBot {
    sender: TelegramNotifier,
    handler: CommandHandler,
    allowed_user_ids: Vec<i64>,
    last_update_id: RwLock<i64>,
}

impl TelegramBot {
    pub fn new(sender: TelegramNotifier, handler: CommandHandler, allowed_user_ids: Vec<i64>) -> Self {
        Self {
            sender,
            handler,
            allowed_user_ids,
            last_update_id: RwLock::new(0),
        }
    }

    /// Poll forever; failures are logged and retried after a short pause
    pub async fn start_polling(self: Arc<Self>) {
        info!(allowed = ?self.allowed_user_ids, "Telegram bot polling started");

        loop {
            if let Err(e) = self.poll_once().await {
                error!(error = %e, "Telegram update polling failed");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }

    /// Fetch one batch of updates and answer each; returns the batch size
    pub async fn poll_once(&self) -> Result<usize> {
        let updates = self.poll_updates().await?;
        let count = updates.len();

        for update in updates {
            if let Err(e) = self.process_update(update).await {
                error!(error = %e, "failed to process Telegram update");
            }
        }
        Ok(count)
    }

    async fn poll_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = *self.last_update_id.read().await + 1;

        let params = serde_json::json!({
            "offset": offset,
            "timeout": LONG_POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let response = self
            .sender
            .http()
            .post(self.sender.method_url("getUpdates"))
            .json(&params)
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 5))
            .send()
            .await?;

        let updates: TelegramUpdates = response.json().await?;
        if !updates.ok {
            return Err(RelayError::InvalidResponse(format!(
                "getUpdates failed: {}",
                updates.description.unwrap_or_default()
            )));
        }

        if let Some(last) = updates.result.last() {
            *self.last_update_id.write().await = last.update_id;
        }

        Ok(updates.result)
    }

    async fn process_update(&self, update: TelegramUpdate) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };

        let chat_id = message.chat.id;
        let reply = self.respond(&message).await;

        match reply {
            Some(reply) => {
                self.sender
                    .send_message(&chat_id.to_string(), &reply.text, reply.parse_mode)
                    .await
            }
            None => Ok(()),
        }
    }

    /// Decide the reply for a message; `None` when there is nothing to answer
    pub async fn respond(&self, message: &TelegramMessage) -> Option<CommandReply> {
        let user_id = message.from.as_ref().map(|u| u.id);

        if !user_id.is_some_and(|id| self.is_authorized(id)) {
            warn!(?user_id, chat_id = message.chat.id, "unauthorized access attempt");
            return Some(CommandReply::plain(UNAUTHORIZED_REPLY));
        }

        let text = message.text.as_deref()?;
        debug!(?user_id, text, "command received");

        let first_name = message.from.as_ref().and_then(|u| u.first_name.as_deref());
        Some(self.handler.handle_text(text, first_name).await)
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.allowed_user_ids.contains(&user_id)
    }
}
