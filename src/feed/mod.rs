//! HTTP client for the remote event feed
//!
//! The feed is a single JSON document listing currently known events. The
//! client does one GET per refresh cycle with a bounded timeout so a hung
//! feed server cannot stall the polling loop indefinitely.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default upstream feed location
pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/ccev/pogoinfo/v2/active/events.json";

/// Default request timeout for feed fetches
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching the event feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP request error (connect, timeout, body decode)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code from the feed server
    #[error("Feed server returned status {0}")]
    Status(u16),
}

/// One bonus entry attached to a raw event record
#[derive(Debug, Clone, Deserialize)]
pub struct RawBonus {
    /// Bonus template tag; `longer-lure` marks an extended lure duration
    #[serde(default)]
    pub template: String,

    /// Bonus value; for `longer-lure` this is the duration in hours
    #[serde(default)]
    pub value: Option<f64>,
}

/// One event record exactly as the feed delivers it.
///
/// Everything except `name` is nullable or optional upstream; validation
/// happens in the classifier, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Local start time, `"YYYY-MM-DD HH:MM"`; null when the event was
    /// published after it already started
    pub start: Option<String>,

    /// Local end time, same format
    pub end: Option<String>,

    #[serde(default)]
    pub has_spawnpoints: bool,

    #[serde(default)]
    pub has_quests: bool,

    /// Spawn overrides; a non-empty list implies a changed monster pool
    #[serde(default)]
    pub spawns: Vec<serde_json::Value>,

    #[serde(default)]
    pub bonuses: Vec<RawBonus>,
}

/// HTTP client for the event feed
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    /// Create a client for the given feed URL
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Http` if the HTTP client cannot be created
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Feed URL this client polls
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode the current event list
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Status` for non-2xx responses and
    /// `FeedError::Http` for transport or JSON decoding failures.
    pub async fn fetch(&self) -> Result<Vec<RawEvent>, FeedError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let events = response.json::<Vec<RawEvent>>().await?;
        tracing::debug!(count = events.len(), url = %self.url, "fetched event feed");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_full_record() {
        let json = r#"{
            "name": "Community Day Classic",
            "type": "community-day",
            "start": "2010-01-01 14:00",
            "end": "2010-01-01 17:00",
            "has_spawnpoints": true,
            "has_quests": false,
            "spawns": [{"id": 7}],
            "bonuses": [{"template": "longer-lure", "value": 3}]
        }"#;

        let raw: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.name, "Community Day Classic");
        assert_eq!(raw.kind.as_deref(), Some("community-day"));
        assert_eq!(raw.start.as_deref(), Some("2010-01-01 14:00"));
        assert!(raw.has_spawnpoints);
        assert_eq!(raw.spawns.len(), 1);
        assert_eq!(raw.bonuses[0].value, Some(3.0));
    }

    #[test]
    fn test_raw_event_nullable_fields() {
        let json = r#"{
            "name": "Mystery Event",
            "type": null,
            "start": null,
            "end": null
        }"#;

        let raw: RawEvent = serde_json::from_str(json).unwrap();
        assert!(raw.kind.is_none());
        assert!(raw.start.is_none());
        assert!(raw.end.is_none());
        assert!(raw.spawns.is_empty());
        assert!(raw.bonuses.is_empty());
    }

    #[test]
    fn test_bonus_without_value() {
        let json = r#"{"template": "longer-lure"}"#;
        let bonus: RawBonus = serde_json::from_str(json).unwrap();
        assert_eq!(bonus.template, "longer-lure");
        assert!(bonus.value.is_none());
    }
}
