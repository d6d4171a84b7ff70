//! Local event cache file
//!
//! After every successful classification a snapshot of the `all` and
//! `quests` views is rewritten wholesale to a JSON file so external tooling
//! can inspect what the watcher currently believes. Failing to write the
//! cache is logged and otherwise ignored; it never affects the loop.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classify::EventCategories;
use crate::error::Result;
use crate::models::{GameEvent, DB_TIME_FORMAT};

/// One section of the cache document; exactly one field is populated,
/// yielding the `[{"all": [...]}, {"quests": [...]}]` shape on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<GameEvent>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quests: Option<Vec<GameEvent>>,
}

/// The cache document as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDocument {
    /// Local wall-clock instant of the snapshot, `"YYYY-MM-DD HH:MM:SS"`
    pub last_update: String,

    pub events: Vec<CacheSection>,
}

impl CacheDocument {
    /// Build a snapshot document from the current category views
    pub fn from_categories(categories: &EventCategories, now: NaiveDateTime) -> Self {
        Self {
            last_update: now.format(DB_TIME_FORMAT).to_string(),
            events: vec![
                CacheSection {
                    all: Some(categories.all.clone()),
                    quests: None,
                },
                CacheSection {
                    all: None,
                    quests: Some(categories.quest.clone()),
                },
            ],
        }
    }
}

/// Writer/reader for the event cache file
pub struct EventCache {
    path: PathBuf,
}

impl EventCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the cache file with a fresh snapshot
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json` on write failure; callers log
    /// and continue.
    pub fn write(&self, categories: &EventCategories, now: NaiveDateTime) -> Result<()> {
        let document = CacheDocument::from_categories(categories, now);
        let json = serde_json::to_string(&document)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), events = categories.len(), "event cache updated");
        Ok(())
    }

    /// Read the cache file back
    pub fn read(&self) -> Result<CacheDocument> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_categories() -> EventCategories {
        let quest_event = GameEvent {
            name: "Lunar Festival".to_string(),
            kind: "event".to_string(),
            start: NaiveDate::from_ymd_opt(2010, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0),
            end: NaiveDate::from_ymd_opt(2010, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            affects_spawnpoints: false,
            affects_quests: true,
            affects_monsters: false,
            lure_duration_minutes: None,
        };
        let unscheduled = GameEvent {
            name: "Mystery Weekend".to_string(),
            kind: "community-day".to_string(),
            start: None,
            end: NaiveDate::from_ymd_opt(2010, 1, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            affects_spawnpoints: true,
            affects_quests: false,
            affects_monsters: true,
            lure_duration_minutes: Some(180),
        };
        EventCategories {
            all: vec![quest_event.clone(), unscheduled],
            monster: Vec::new(),
            quest: vec![quest_event],
            spawn: Vec::new(),
        }
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EventCache::new(dir.path().join(".eventcache"));
        let categories = sample_categories();
        let now = NaiveDate::from_ymd_opt(2010, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        cache.write(&categories, now).unwrap();
        let document = cache.read().unwrap();

        assert_eq!(document.last_update, "2010-01-01 09:00:00");
        assert_eq!(document.events.len(), 2);
        let all = document.events[0].all.as_ref().unwrap();
        let quests = document.events[1].quests.as_ref().unwrap();
        assert_eq!(all, &categories.all);
        assert_eq!(quests, &categories.quest);
    }

    #[test]
    fn test_write_to_missing_directory_errors() {
        let cache = EventCache::new("/nonexistent-dir/eventcache.json");
        let now = NaiveDate::from_ymd_opt(2010, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(cache.write(&sample_categories(), now).is_err());
    }
}
