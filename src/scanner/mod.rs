//! Scanner backends
//!
//! The watcher talks to the scanner — the external system holding cached
//! world state — through the [`ScannerBackend`] capability trait. Backends
//! differ in what they can do: the database backend mutates scanner tables
//! directly, the management-API backend drives the scanner over HTTP, and
//! the composite backend pairs the two. Operations a backend cannot perform
//! are logged and succeed as no-ops, so the coordinator never needs to know
//! which backend it is driving.

pub mod api;
pub mod composite;
pub mod database;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::ScannerConfig;
use crate::error::Error;
use crate::models::RemoteWindow;

pub use api::ApiBackend;
pub use composite::CompositeBackend;
pub use database::DatabaseBackend;

/// Errors that can occur in scanner backends
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP transport errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the management API
    #[error("Management API returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Rescan trigger command failed
    #[error("Rescan command '{command}' exited with code {code}")]
    Command { command: String, code: i32 },

    /// I/O errors (spawning the rescan command)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed row in the scanner database
    #[error("Invalid event window row: {0}")]
    InvalidRow(String),
}

/// Capability interface to the scanner's cached world state.
///
/// Every operation has a default implementation that logs the gap and
/// returns successfully; concrete backends override what they support.
#[async_trait]
pub trait ScannerBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Wipe the quest pool
    async fn reset_all_quests(&self) -> Result<(), ScannerError> {
        self.log_unsupported("reset_all_quests");
        Ok(())
    }

    /// Wipe the monster pool
    async fn reset_all_monsters(&self) -> Result<(), ScannerError> {
        self.log_unsupported("reset_all_monsters");
        Ok(())
    }

    /// Remove monsters last refreshed before `cutoff_utc` and not yet
    /// expired; everything else is left to age out naturally
    async fn reset_filtered_monsters(&self, cutoff_utc: NaiveDateTime) -> Result<(), ScannerError> {
        let _ = cutoff_utc;
        self.log_unsupported("reset_filtered_monsters");
        Ok(())
    }

    /// Current event windows in the system of record
    async fn list_event_windows(&self) -> Result<Vec<RemoteWindow>, ScannerError> {
        self.log_unsupported("list_event_windows");
        Ok(Vec::new())
    }

    /// Insert a fresh event window with placeholder times
    async fn insert_event_window(&self, name: &str) -> Result<(), ScannerError> {
        let _ = name;
        self.log_unsupported("insert_event_window");
        Ok(())
    }

    /// Overwrite an event window's times and lure duration
    async fn update_event_window(
        &self,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        lure_minutes: i64,
    ) -> Result<(), ScannerError> {
        let _ = (name, start, end, lure_minutes);
        self.log_unsupported("update_event_window");
        Ok(())
    }

    /// Remove an event window entirely
    async fn delete_event_window(&self, name: &str) -> Result<(), ScannerError> {
        let _ = name;
        self.log_unsupported("delete_event_window");
        Ok(())
    }

    /// Ask the scanner to rescan after a quest wipe
    async fn trigger_rescan(&self) -> Result<(), ScannerError> {
        self.log_unsupported("trigger_rescan");
        Ok(())
    }

    #[doc(hidden)]
    fn log_unsupported(&self, operation: &str) {
        tracing::warn!(
            backend = self.name(),
            operation,
            "operation not supported by this backend, skipping"
        );
    }
}

/// Build the configured scanner backend.
///
/// # Errors
///
/// Returns `Error::Config` for an unknown backend name and the underlying
/// error when a backend cannot be constructed.
pub fn backend_from_config(config: &ScannerConfig) -> crate::error::Result<Arc<dyn ScannerBackend>> {
    match config.backend.as_str() {
        "database" => {
            let backend = DatabaseBackend::open(
                &config.database_path,
                config.rescan_command.clone(),
            )?;
            backend.ensure_schema()?;
            Ok(Arc::new(backend))
        }
        "api" => {
            let backend = ApiBackend::new(&config.api_url, config.api_token.clone())?;
            Ok(Arc::new(backend))
        }
        "composite" => {
            let store = DatabaseBackend::open(
                &config.database_path,
                config.rescan_command.clone(),
            )?;
            store.ensure_schema()?;
            let control = ApiBackend::new(&config.api_url, config.api_token.clone())?;
            Ok(Arc::new(CompositeBackend::new(
                Arc::new(store),
                Arc::new(control),
            )))
        }
        other => Err(Error::config(format!("unknown scanner backend '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareBackend;

    impl ScannerBackend for BareBackend {
        fn name(&self) -> &'static str {
            "bare"
        }
    }

    #[tokio::test]
    async fn test_default_operations_are_noops() {
        let backend = BareBackend;

        assert!(backend.reset_all_quests().await.is_ok());
        assert!(backend.reset_all_monsters().await.is_ok());
        assert!(backend.trigger_rescan().await.is_ok());
        assert!(backend.insert_event_window("Others").await.is_ok());
        assert!(backend.delete_event_window("Others").await.is_ok());
        let windows = backend.list_event_windows().await.unwrap();
        assert!(windows.is_empty());
    }
}
