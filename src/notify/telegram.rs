//! Telegram chat notification channel
//!
//! Sends quest reset announcements through a bot to a list of chat ids.
//! The message tells operators whether the rescan will happen now or has
//! to wait for the configured rescan window of the day.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveTime, Timelike};
use reqwest::Client;
use serde::Deserialize;

use super::{Boundary, ChannelError, NotifyChannel};
use crate::config::{QuestResetConfig, RescanWindow, TelegramConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Decoded Telegram Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram bot channel
pub struct TelegramChannel {
    client: Client,
    base_url: String,
    chat_ids: Vec<String>,
    rescan_window: RescanWindow,
}

impl TelegramChannel {
    /// Build the channel from the telegram and quest-reset config sections.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::InvalidConfig` for a missing token, empty
    /// chat id list, or malformed rescan window.
    pub fn from_config(
        telegram: &TelegramConfig,
        quest_reset: &QuestResetConfig,
    ) -> Result<Self, ChannelError> {
        if telegram.bot_token.is_empty() {
            return Err(ChannelError::InvalidConfig(
                "telegram enabled without bot_token".to_string(),
            ));
        }
        if telegram.chat_ids.is_empty() {
            return Err(ChannelError::InvalidConfig(
                "telegram enabled without chat_ids".to_string(),
            ));
        }
        let rescan_window = RescanWindow::parse(&quest_reset.rescan_window)
            .map_err(ChannelError::InvalidConfig)?;

        Self::new(
            format!("https://api.telegram.org/bot{}/", telegram.bot_token),
            telegram.chat_ids.clone(),
            rescan_window,
        )
    }

    /// Build the channel against an explicit API base URL, for tests
    pub fn new(
        base_url: impl Into<String>,
        chat_ids: Vec<String>,
        rescan_window: RescanWindow,
    ) -> Result<Self, ChannelError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            chat_ids,
            rescan_window,
        })
    }

    /// Send one message to one chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let url = format!("{}sendMessage", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("chat_id", chat_id),
                ("text", text),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await?
            .json::<ApiResponse>()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(ChannelError::Rejected(
                response
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ))
        }
    }

    /// Pick the rescan hint depending on where `now` falls relative to the
    /// daily rescan window
    fn rescan_hint(&self, now: NaiveTime) -> String {
        let hour = now.hour();
        if hour < self.rescan_window.start_hour {
            rust_i18n::t!("notify.telegram.rescan_before").into_owned()
        } else if hour < self.rescan_window.end_hour {
            rust_i18n::t!("notify.telegram.rescan_during").into_owned()
        } else {
            rust_i18n::t!("notify.telegram.rescan_after").into_owned()
        }
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify_quest_reset(
        &self,
        event_name: &str,
        boundary: Boundary,
    ) -> Result<(), ChannelError> {
        let text = rust_i18n::t!(
            "notify.telegram.quest_reset",
            trigger = boundary.localized(),
            name = event_name,
            rescan = self.rescan_hint(Local::now().time())
        )
        .into_owned();

        let mut failures = 0;
        for chat_id in &self.chat_ids {
            match self.send_message(chat_id, &text).await {
                Ok(()) => tracing::info!(chat_id = %chat_id, "telegram notification sent"),
                Err(err) => {
                    failures += 1;
                    tracing::error!(chat_id = %chat_id, %err, "telegram notification failed");
                }
            }
        }

        if failures == self.chat_ids.len() {
            return Err(ChannelError::Rejected(
                "all telegram destinations failed".to_string(),
            ));
        }
        Ok(())
    }
}
