//! Composite scanner backend
//!
//! A plain decorator pairing two backends: a `store` backend for state
//! mutation and window bookkeeping (typically the database backend) and a
//! `control` backend for rescan triggering (typically the management API).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{ScannerBackend, ScannerError};
use crate::models::RemoteWindow;

/// Backend delegating state operations and control operations separately
pub struct CompositeBackend {
    store: Arc<dyn ScannerBackend>,
    control: Arc<dyn ScannerBackend>,
}

impl CompositeBackend {
    pub fn new(store: Arc<dyn ScannerBackend>, control: Arc<dyn ScannerBackend>) -> Self {
        Self { store, control }
    }
}

#[async_trait]
impl ScannerBackend for CompositeBackend {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn reset_all_quests(&self) -> Result<(), ScannerError> {
        self.store.reset_all_quests().await
    }

    async fn reset_all_monsters(&self) -> Result<(), ScannerError> {
        self.store.reset_all_monsters().await
    }

    async fn reset_filtered_monsters(&self, cutoff_utc: NaiveDateTime) -> Result<(), ScannerError> {
        self.store.reset_filtered_monsters(cutoff_utc).await
    }

    async fn list_event_windows(&self) -> Result<Vec<RemoteWindow>, ScannerError> {
        self.store.list_event_windows().await
    }

    async fn insert_event_window(&self, name: &str) -> Result<(), ScannerError> {
        self.store.insert_event_window(name).await
    }

    async fn update_event_window(
        &self,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        lure_minutes: i64,
    ) -> Result<(), ScannerError> {
        self.store
            .update_event_window(name, start, end, lure_minutes)
            .await
    }

    async fn delete_event_window(&self, name: &str) -> Result<(), ScannerError> {
        self.store.delete_event_window(name).await
    }

    async fn trigger_rescan(&self) -> Result<(), ScannerError> {
        self.control.trigger_rescan().await
    }
}
