//! Outbound alert channel.
//!
//! [`Notifier`] is fire-and-forget from the pipeline's point of view:
//! implementations deal with (and log) their own delivery failures.

pub mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramNotifier;

/// Delivers a text message to a set of recipients.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Sends `text` to every recipient in `recipients`.
    async fn notify(&self, recipients: &[i64], text: &str);
}

/// Notifier that only writes alerts to the log.
///
/// Used when no delivery channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipients: &[i64], text: &str) {
        tracing::info!(recipients = recipients.len(), text, "alert (log only)");
    }
}
