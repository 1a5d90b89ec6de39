//! Telegram Bot API client.
//!
//! Only the three methods the bot needs: `sendMessage`, `getUpdates` and
//! `answerCallbackQuery`. Every call checks the `ok` flag of the response
//! envelope.

use super::message::Notification;
use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};
use dxarb_core::BoxFuture;
use dxarb_telemetry::Metrics;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Slack added on top of the long-poll timeout for the HTTP request.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// `reply_markup` with inline buttons, one inner vec per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn rows(rows: Vec<Vec<InlineButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat the update came from.
    pub fn chat_id(&self) -> Option<i64> {
        self.message
            .as_ref()
            .or_else(|| self.callback_query.as_ref()?.message.as_ref())
            .map(|m| m.chat.id)
    }
}

/// Telegram Bot API client bound to one bot token and one chat.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    chat_id: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Notify(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
            poll_timeout: config.poll_timeout(),
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send an HTML message to the configured chat.
    pub async fn send_message(&self, text: &str, keyboard: Option<&InlineKeyboard>) -> AppResult<()> {
        let mut body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| AppError::Notify(format!("keyboard: {e}")))?;
        }

        let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
        debug!("Message sent to Telegram");
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> AppResult<Vec<Update>> {
        let mut body = json!({
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body, Some(self.poll_timeout + POLL_GRACE))
            .await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> AppResult<()> {
        let body = json!({ "callback_query_id": callback_query_id });
        let _: serde_json::Value = self.call("answerCallbackQuery", &body, None).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> AppResult<T> {
        let started = Instant::now();
        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let result: AppResult<T> = async {
            let response = request
                .send()
                .await
                .map_err(|e| AppError::Notify(format!("{method}: {}", e.without_url())))?;
            let status = response.status();
            let envelope: ApiResponse<T> = response
                .json()
                .await
                .map_err(|e| AppError::Notify(format!("{method}: HTTP {status}: {e}")))?;

            if !envelope.ok {
                return Err(AppError::Notify(format!(
                    "{method}: {}",
                    envelope
                        .description
                        .unwrap_or_else(|| format!("HTTP {status}"))
                )));
            }
            envelope
                .result
                .ok_or_else(|| AppError::Notify(format!("{method}: missing result")))
        }
        .await;

        if method != "getUpdates" {
            Metrics::request_latency("telegram", method, started.elapsed().as_secs_f64() * 1000.0);
        }
        result
    }
}

/// Notifier that posts to the configured Telegram chat.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

impl Notifier for TelegramNotifier {
    fn send<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let sent = match self.client.send_message(&notification.render(), None).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(kind = notification.kind(), error = %e, "Failed to send notification");
                    false
                }
            };
            Metrics::notification(notification.kind(), sent);
            sent
        })
    }
}
