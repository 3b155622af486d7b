//! Telegram Bot API notification client

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TelegramConfig;
use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};

/// Error body returned by the Bot API, e.g. `{"ok":false,"error_code":401,"description":"Unauthorized"}`
#[derive(Debug, Deserialize)]
struct TelegramErrorBody {
    #[serde(default)]
    description: Option<String>,
}

/// Telegram notification sender
pub struct TelegramNotifier {
    endpoint: String,
    chat_id: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, http: Arc<dyn HttpClient>) -> Self {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_url.trim_end_matches('/'),
            config.bot_token
        );

        tracing::debug!("Created TelegramNotifier for chat '{}'", config.chat_id);

        Self {
            endpoint,
            chat_id: config.chat_id.clone(),
            http,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn type_name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", notification.message.as_str()),
        ];

        tracing::debug!(
            "Sending Telegram {} notification to chat '{}'",
            notification.kind,
            self.chat_id
        );

        let response = self.http.post_form(&self.endpoint, &params).await?;

        if response.status != 200 {
            let detail = serde_json::from_str::<TelegramErrorBody>(&response.body)
                .ok()
                .and_then(|b| b.description)
                .unwrap_or(response.body);
            return Err(crate::SentinelError::Notifier(format!(
                "Telegram API returned status {}: {}",
                response.status, detail
            )));
        }

        tracing::debug!("Telegram notification sent successfully");
        Ok(())
    }
}
