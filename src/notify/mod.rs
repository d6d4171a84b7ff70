//! Operator notification channels
//!
//! When a quest reset fires, every enabled channel gets told. Channels are
//! fire-and-forget: a failing channel (or a failing destination within a
//! channel) is logged and never blocks the others or the detection loop.

pub mod discord;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::error::Result;

pub use discord::DiscordChannel;
pub use telegram::TelegramChannel;

/// Errors that can occur during notification delivery
#[derive(Error, Debug)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service rejected the message
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Which event boundary triggered the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boundary::Start => "start",
            Boundary::End => "end",
        }
    }

    /// Localized trigger phrase ("started" / "ended")
    pub fn localized(&self) -> String {
        match self {
            Boundary::Start => rust_i18n::t!("notify.trigger.start").into_owned(),
            Boundary::End => rust_i18n::t!("notify.trigger.end").into_owned(),
        }
    }
}

/// A single notification channel (chat bot, webhook, ...)
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &'static str;

    /// Announce a quest reset caused by `event_name` crossing `boundary`
    async fn notify_quest_reset(
        &self,
        event_name: &str,
        boundary: Boundary,
    ) -> std::result::Result<(), ChannelError>;
}

/// Dispatches notifications to all enabled channels, isolating failures
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn NotifyChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    /// Build the notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Notify` when an enabled channel is misconfigured;
    /// this is fatal at startup, before the loop begins.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut channels: Vec<Box<dyn NotifyChannel>> = Vec::new();

        if config.telegram.enable {
            tracing::info!("telegram notifications enabled");
            channels.push(Box::new(TelegramChannel::from_config(
                &config.telegram,
                &config.quest_reset,
            )?));
        }
        if config.discord.enable {
            tracing::info!("discord notifications enabled");
            channels.push(Box::new(DiscordChannel::from_config(&config.discord)?));
        }

        Ok(Self::new(channels))
    }

    /// Number of configured channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send the quest-reset announcement to every channel.
    ///
    /// Channel failures are logged here and never propagated.
    pub async fn dispatch_quest_reset(&self, event_name: &str, boundary: Boundary) {
        for channel in &self.channels {
            if let Err(err) = channel.notify_quest_reset(event_name, boundary).await {
                tracing::error!(
                    channel = channel.name(),
                    event = event_name,
                    boundary = boundary.as_str(),
                    %err,
                    "quest reset notification failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Flaky {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl NotifyChannel for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn notify_quest_reset(
            &self,
            _event_name: &str,
            _boundary: Boundary,
        ) -> std::result::Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::Rejected("nope".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let notifier = Notifier::new(vec![
            Box::new(Flaky {
                calls: first.clone(),
                fail: true,
            }),
            Box::new(Flaky {
                calls: second.clone(),
                fail: false,
            }),
        ]);

        notifier
            .dispatch_quest_reset("Community Day", Boundary::Start)
            .await;

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_boundary_as_str() {
        assert_eq!(Boundary::Start.as_str(), "start");
        assert_eq!(Boundary::End.as_str(), "end");
    }
}
