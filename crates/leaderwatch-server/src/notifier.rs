//! Alert delivery: Telegram transport with a log-only fallback, behind a
//! dedicated delivery task.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Best-effort alert sink. Failures are logged, never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Sends alerts as Telegram messages in Markdown parse mode.
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, token: &str, chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{api_url}{token}/sendMessage"),
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(reply) if reply.get("ok").and_then(|v| v.as_bool()) == Some(true) => {
                    debug!("Telegram message sent");
                }
                Ok(reply) => {
                    warn!(response = %reply, "Telegram rejected message");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to decode Telegram response");
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to send Telegram message");
            }
        }
    }
}

/// Fallback sink when no Telegram credentials are configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!(alert = %message, "Alert");
    }
}

/// Dedicated delivery task: drains the alert channel sequentially so no
/// send ever outlives the cycle that produced it unaccounted.
pub struct NotifierTask {
    alert_rx: mpsc::Receiver<String>,
    notifier: Arc<dyn Notifier>,
}

impl NotifierTask {
    pub fn new(alert_rx: mpsc::Receiver<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self { alert_rx, notifier }
    }

    /// Run until every sender is gone.
    pub async fn run(mut self) {
        info!("Notifier task started");

        while let Some(message) = self.alert_rx.recv().await {
            self.notifier.notify(&message).await;
        }

        info!("Notifier task stopped");
    }
}
