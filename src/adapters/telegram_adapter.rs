//! Telegram alert adapter.
//!
//! Bridges the synchronous pipeline into a one-shot async `sendMessage` call
//! on a current-thread tokio runtime, blocking until delivery completes. With
//! unset credentials the adapter degrades to a warning no-op, so a run never
//! fails just because alerting is unconfigured.

use crate::domain::error::PipelineError;
use crate::ports::alert_port::AlertPort;
use serde_json::json;
use tracing::{info, warn};

const API_URL: &str = "https://api.telegram.org";

pub struct TelegramAdapter {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramAdapter {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, PipelineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PipelineError::Alert {
                reason: format!("failed to build runtime: {e}"),
            })?;

        Ok(Self {
            runtime,
            client: reqwest::Client::new(),
            bot_token,
            chat_id,
        })
    }

    fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    async fn send_message(&self, message: &str) -> Result<(), PipelineError> {
        let url = format!("{}/bot{}/sendMessage", API_URL, self.bot_token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Alert {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Alert {
                reason: format!("HTTP status {}", response.status()),
            });
        }
        Ok(())
    }
}

impl AlertPort for TelegramAdapter {
    fn send(&self, message: &str) -> Result<(), PipelineError> {
        if !self.is_configured() {
            warn!("telegram bot token or chat id not configured, skipping alert");
            return Ok(());
        }

        self.runtime.block_on(self.send_message(message))?;
        info!("telegram alert sent");
        Ok(())
    }
}
