//! Telegram Bot API notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::Notifier;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends alerts as Telegram messages, one `sendMessage` call per chat.
///
/// A failed delivery is logged and does not stop delivery to the
/// remaining recipients.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The endpoint embeds the bot token.
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Creates a notifier for the bot identified by `bot_token`.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client fails to build.
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{TELEGRAM_API}/bot{bot_token}/sendMessage"),
        })
    }

    async fn send(&self, chat_id: i64, text: &str) -> Result<(), reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipients: &[i64], text: &str) {
        let mut delivered = 0usize;
        for &chat_id in recipients {
            match self.send(chat_id, text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(chat_id, error = %e.without_url(), "telegram delivery failed"),
            }
        }
        debug!(delivered, total = recipients.len(), "telegram alert sent");
    }
}
