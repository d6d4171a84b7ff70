//! Reset coordination
//!
//! [`ResetCoordinator`] owns the edge-detection state machine. Category
//! views are replaced wholesale on every feed refresh, but the per-category
//! checkpoints live here and survive those replacements; detection is tied
//! to timestamps, never to event identity.
//!
//! Tick order is load-bearing: monster checks, then quest checks, then (on
//! refresh cycles) spawn window reconciliation — so a refresh can never
//! replace category views before the pending transition checks ran against
//! them. Each step isolates its own failures and advances its checkpoint
//! regardless, preferring a missed retry over re-firing forever.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::classify::EventCategories;
use crate::config::{MonsterResetStrategy, QuestResetPolicy};
use crate::models::{
    placeholder_window_time, RemoteWindow, TickWindow, DEFAULT_LURE_MINUTES, KNOWN_BUCKETS,
};
use crate::notify::{Boundary, Notifier};
use crate::scanner::{ScannerBackend, ScannerError};

/// Coordinator behavior knobs, fixed at startup
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub monster_strategy: MonsterResetStrategy,
    pub quest_policy: QuestResetPolicy,
    pub delete_unknown_windows: bool,

    /// Local-to-UTC offset in whole hours; event times are local, the
    /// scanner's monster timestamps are UTC
    pub utc_offset_hours: i64,
}

/// Drives resets and reconciliation against the scanner backend
pub struct ResetCoordinator {
    scanner: Arc<dyn ScannerBackend>,
    notifier: Notifier,
    settings: CoordinatorSettings,
    categories: EventCategories,
    last_monster_check: NaiveDateTime,
    last_quest_check: NaiveDateTime,
}

impl ResetCoordinator {
    /// Create a coordinator with both checkpoints at `now`
    pub fn new(
        scanner: Arc<dyn ScannerBackend>,
        notifier: Notifier,
        settings: CoordinatorSettings,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            scanner,
            notifier,
            settings,
            categories: EventCategories::default(),
            last_monster_check: now,
            last_quest_check: now,
        }
    }

    /// Replace the category views after a feed refresh.
    ///
    /// Checkpoints are untouched; they outlive any particular event list.
    pub fn replace_categories(&mut self, categories: EventCategories) {
        self.categories = categories;
    }

    /// Current category views
    pub fn categories(&self) -> &EventCategories {
        &self.categories
    }

    /// Check the monster category for a boundary crossing since the last
    /// check and reset the monster pool for the first event that has one.
    pub async fn check_monster_resets(&mut self, now: NaiveDateTime) {
        tracing::info!("checking monster pool events");
        let window = TickWindow::new(self.last_monster_check, now);
        if let Err(err) = self.run_monster_check(&window).await {
            tracing::error!(%err, "error while checking monster resets");
        }
        // advance even after a failure: a missed retry beats endless re-firing
        self.last_monster_check = now;
    }

    async fn run_monster_check(&self, window: &TickWindow) -> Result<(), ScannerError> {
        for event in &self.categories.monster {
            let boundary = if event.started_within(window) {
                event.start.map(|start| (Boundary::Start, start))
            } else if event.ended_within(window) {
                Some((Boundary::End, event.end))
            } else {
                None
            };
            let Some((boundary, instant)) = boundary else {
                continue;
            };

            tracing::info!(
                event = %event.name,
                kind = %event.kind,
                boundary = boundary.as_str(),
                "event boundary detected, resetting monster pool"
            );
            // monsters scanned before the boundary describe the old pool;
            // the scanner keeps their timestamps in UTC
            let cutoff_utc = instant - Duration::hours(self.settings.utc_offset_hours);
            match self.settings.monster_strategy {
                MonsterResetStrategy::Filtered => {
                    self.scanner.reset_filtered_monsters(cutoff_utc).await?;
                }
                MonsterResetStrategy::All => {
                    self.scanner.reset_all_monsters().await?;
                }
            }
            // at most one reset per tick, earliest qualifying event wins
            return Ok(());
        }
        Ok(())
    }

    /// Check the quest category for a boundary crossing since the last
    /// check; the first qualifying event wipes the quest pool, triggers a
    /// rescan and notifies operators.
    pub async fn check_quest_resets(&mut self, now: NaiveDateTime) {
        tracing::info!("checking quest pool events");
        let window = TickWindow::new(self.last_quest_check, now);
        if let Err(err) = self.run_quest_check(&window).await {
            tracing::error!(%err, "error while checking quest resets");
        }
        self.last_quest_check = now;
    }

    async fn run_quest_check(&self, window: &TickWindow) -> Result<(), ScannerError> {
        for event in &self.categories.quest {
            let edges = self.settings.quest_policy.edges_for(&event.kind);
            let boundary = if edges.on_start && event.started_within(window) {
                Some(Boundary::Start)
            } else if edges.on_end && event.ended_within(window) {
                Some(Boundary::End)
            } else {
                None
            };
            let Some(boundary) = boundary else {
                continue;
            };

            tracing::info!(
                event = %event.name,
                kind = %event.kind,
                boundary = boundary.as_str(),
                "event boundary detected, resetting quest pool"
            );
            self.scanner.reset_all_quests().await?;
            self.scanner.trigger_rescan().await?;
            self.notifier
                .dispatch_quest_reset(&event.name, boundary)
                .await;
            return Ok(());
        }
        Ok(())
    }

    /// Reconcile the scanner's event windows against the spawn category.
    ///
    /// Runs on every refresh cycle, not edge-triggered: remote state is
    /// always recomputed from the current classification.
    pub async fn reconcile_spawn_windows(&self) {
        tracing::info!("reconciling spawn event windows");
        if let Err(err) = self.run_spawn_reconciliation().await {
            tracing::error!(%err, "error while reconciling spawn windows");
        }
    }

    async fn run_spawn_reconciliation(&self) -> Result<(), ScannerError> {
        let mut remote: HashMap<String, RemoteWindow> = self
            .scanner
            .list_event_windows()
            .await?
            .into_iter()
            .map(|window| (window.name.clone(), window))
            .collect();

        // every managed window must exist before updates are compared
        for bucket in KNOWN_BUCKETS {
            if !remote.contains_key(bucket) {
                self.scanner.insert_event_window(bucket).await?;
                remote.insert(
                    bucket.to_string(),
                    RemoteWindow {
                        name: bucket.to_string(),
                        start: placeholder_window_time(),
                        end: placeholder_window_time(),
                    },
                );
            }
        }

        let mut reconciled: HashSet<&str> = HashSet::new();
        for event in &self.categories.spawn {
            let bucket = event.bucket_name();
            if reconciled.contains(bucket) {
                continue;
            }
            // an unscheduled event cannot claim the window yet; a later
            // event of the same bucket may still do so this cycle
            let Some(start) = event.start else {
                continue;
            };
            let Some(current) = remote.get(bucket) else {
                continue;
            };
            if current.start != start || current.end != event.end {
                let lure_minutes = event
                    .lure_duration_minutes
                    .unwrap_or(DEFAULT_LURE_MINUTES);
                self.scanner
                    .update_event_window(bucket, start, event.end, lure_minutes)
                    .await?;
            }
            reconciled.insert(bucket);
        }

        if self.settings.delete_unknown_windows {
            for name in remote.keys() {
                if !KNOWN_BUCKETS.contains(&name.as_str()) {
                    self.scanner.delete_event_window(name).await?;
                }
            }
        }
        Ok(())
    }
}
