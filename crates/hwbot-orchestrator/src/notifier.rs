//! Message delivery to the configured Telegram chat.
//!
//! [`MessageTransport`] is the seam between the poll loop and the outside
//! world. [`Notifier`] wraps a transport and turns delivery failures into log
//! entries so a dropped message never stops the loop.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{HwbotError, Result};

/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Sends plain text to a chat.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Delivers `text` to `chat_id`.
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TgResponse {
    ok: bool,
    description: Option<String>,
}

/// Telegram Bot API transport.
#[derive(Clone)]
pub struct TelegramTransport {
    client: Client,
    send_url: String,
}

impl TelegramTransport {
    /// Builds a transport for the configured bot.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigValidationError` if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.settings.request_timeout())
            .build()
            .map_err(|e| {
                HwbotError::config_validation(
                    format!("cannot build HTTP client: {e}"),
                    "Check the TLS configuration of this host",
                )
            })?;

        let base = config.settings.telegram_api_url.trim_end_matches('/');
        Ok(Self {
            client,
            send_url: format!("{base}/bot{}/sendMessage", config.credentials.telegram_token),
        })
    }
}

/// Splits text into pieces Telegram will accept, on character boundaries.
pub(crate) fn split_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(TELEGRAM_MESSAGE_LIMIT)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        for chunk in split_message(text) {
            let payload = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            let resp = self
                .client
                .post(&self.send_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| HwbotError::send_failed(format!("sendMessage request failed: {}", e.without_url())))?;
            let body: TgResponse = resp
                .json()
                .await
                .map_err(|e| HwbotError::send_failed(format!("sendMessage parse failed: {}", e.without_url())))?;
            if !body.ok {
                return Err(HwbotError::send_failed(
                    body.description
                        .unwrap_or_else(|| "sendMessage failed".to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Best-effort sender bound to a single recipient.
#[derive(Debug, Clone)]
pub struct Notifier<T> {
    transport: T,
    chat_id: String,
}

impl<T: MessageTransport> Notifier<T> {
    /// Creates a notifier that delivers to `chat_id`.
    pub fn new(transport: T, chat_id: impl Into<String>) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
        }
    }

    /// The recipient chat id.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `text` and reports whether it was delivered.
    ///
    /// Delivery failures are logged and never propagated.
    pub async fn notify(&self, text: &str) -> bool {
        tracing::debug!(chat_id = %self.chat_id, "Sending message");
        match self.transport.send(&self.chat_id, text).await {
            Ok(()) => {
                tracing::debug!(chat_id = %self.chat_id, "Message sent");
                true
            }
            Err(e) => {
                tracing::error!(chat_id = %self.chat_id, error = %e, "Failed to send message");
                false
            }
        }
    }
}
