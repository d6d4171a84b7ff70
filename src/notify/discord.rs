//! Discord webhook notification channel
//!
//! Posts an embed to each configured webhook URL. Destinations fail
//! independently; one unreachable webhook never blocks the rest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{Boundary, ChannelError, NotifyChannel};
use crate::config::DiscordConfig;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Discord webhook channel
pub struct DiscordChannel {
    client: Client,
    webhook_urls: Vec<String>,
    username: String,
    embed_title: String,
}

impl DiscordChannel {
    /// Build the channel from the discord config section.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::InvalidConfig` when no webhook URL is
    /// configured or a URL does not parse.
    pub fn from_config(discord: &DiscordConfig) -> Result<Self, ChannelError> {
        if discord.webhook_urls.is_empty() {
            return Err(ChannelError::InvalidConfig(
                "discord enabled without webhook_urls".to_string(),
            ));
        }
        for raw in &discord.webhook_urls {
            Url::parse(raw).map_err(|e| {
                ChannelError::InvalidConfig(format!("bad webhook url '{raw}': {e}"))
            })?;
        }

        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_urls: discord.webhook_urls.clone(),
            username: discord.username.clone(),
            embed_title: discord.embed_title.clone(),
        })
    }

    /// Post one embed to one webhook URL
    async fn post_embed(&self, url: &str, description: &str) -> Result<(), ChannelError> {
        let payload = serde_json::json!({
            "content": "",
            "username": self.username,
            "embeds": [{
                "title": self.embed_title,
                "description": description,
            }],
        });

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ChannelError::Rejected(format!("HTTP {status}")))
        }
    }
}

#[async_trait]
impl NotifyChannel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn notify_quest_reset(
        &self,
        event_name: &str,
        boundary: Boundary,
    ) -> Result<(), ChannelError> {
        let description = rust_i18n::t!(
            "notify.discord.quest_reset",
            trigger = boundary.localized(),
            name = event_name
        )
        .into_owned();

        let mut failures = 0;
        for url in &self.webhook_urls {
            match self.post_embed(url, &description).await {
                Ok(()) => tracing::info!(webhook = %url, "discord notification sent"),
                Err(err) => {
                    failures += 1;
                    tracing::error!(webhook = %url, %err, "discord notification failed");
                }
            }
        }

        if failures == self.webhook_urls.len() {
            return Err(ChannelError::Rejected(
                "all discord destinations failed".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_validates_urls() {
        let mut discord = DiscordConfig {
            enable: true,
            ..DiscordConfig::default()
        };
        assert!(DiscordChannel::from_config(&discord).is_err());

        discord.webhook_urls = vec!["not a url".to_string()];
        assert!(DiscordChannel::from_config(&discord).is_err());

        discord.webhook_urls = vec!["https://discord.com/api/webhooks/1/abc".to_string()];
        assert!(DiscordChannel::from_config(&discord).is_ok());
    }
}
