//! Management-API scanner backend
//!
//! Drives a scanner over its HTTP management API. The API exposes control
//! operations (pool flushes, rescan) but no event-window bookkeeping, so
//! the window operations fall through to the trait's logged no-ops.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;

use super::{ScannerBackend, ScannerError};
use crate::models::DB_TIME_FORMAT;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Scanner backend calling a remote management API
pub struct ApiBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiBackend {
    /// Create a backend for the management API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::Http` if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ScannerError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), ScannerError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint = %url, "management API call succeeded");
            Ok(())
        } else {
            Err(ScannerError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl ScannerBackend for ApiBackend {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn reset_all_quests(&self) -> Result<(), ScannerError> {
        self.post("/api/quests/flush", serde_json::json!({})).await?;
        tracing::info!("quest pool reset via management API");
        Ok(())
    }

    async fn reset_all_monsters(&self) -> Result<(), ScannerError> {
        self.post("/api/monsters/flush", serde_json::json!({}))
            .await?;
        tracing::info!("monster pool reset via management API");
        Ok(())
    }

    async fn reset_filtered_monsters(&self, cutoff_utc: NaiveDateTime) -> Result<(), ScannerError> {
        let cutoff = cutoff_utc.format(DB_TIME_FORMAT).to_string();
        self.post(
            "/api/monsters/flush",
            serde_json::json!({ "refreshed_before": cutoff }),
        )
        .await?;
        tracing::info!(%cutoff, "monster pool reset (filtered) via management API");
        Ok(())
    }

    async fn trigger_rescan(&self) -> Result<(), ScannerError> {
        self.post("/api/rescan", serde_json::json!({})).await?;
        tracing::info!("rescan triggered via management API");
        Ok(())
    }
}
