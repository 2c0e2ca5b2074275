//! Telegram notification collaborator. The cycle treats notification
//! failures as non-fatal; this adapter only reports them.

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::json;

use crate::ports::Notifier;

pub struct TelegramNotifier {
    http: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        Self::with_url(
            format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
            chat_id,
        )
    }

    pub fn with_url(url: String, chat_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            chat_id: chat_id.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .context("telegram sendMessage request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("telegram sendMessage failed: {status} {body}");
        }
        Ok(())
    }
}

/// Used when Telegram is not configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
