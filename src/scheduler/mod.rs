//! The polling loop
//!
//! [`Watcher`] owns the cadences: transition checks run on a fixed fast
//! tick, the feed refresh on a slow configurable interval. Refreshes run
//! strictly after the tick's transition checks, so an event ending right
//! before a refresh is detected before its category entry disappears.
//!
//! The loop is strictly sequential: one tick fully completes, including
//! all blocking collaborator calls, before the next begins. The three
//! checkpoints and four category views are touched from nowhere else, which
//! is the whole no-double-fire argument.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Offset};
use std::time::Duration;

use crate::cache::EventCache;
use crate::classify::{Classifier, EventCategories};
use crate::config::Config;
use crate::coordinator::{CoordinatorSettings, ResetCoordinator};
use crate::error::{Error, Result};
use crate::feed::FeedClient;
use crate::notify::Notifier;
use crate::scanner;

/// Fixed delay between transition-check ticks, independent of the
/// configured refresh interval
const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Current local wall-clock instant; event feed times are local too
fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Local-to-UTC offset in whole hours, rounded
fn utc_offset_hours() -> i64 {
    let seconds = Local::now().offset().fix().local_minus_utc();
    (f64::from(seconds) / 3600.0).round() as i64
}

/// The polling daemon: collaborators plus the refresh timestamp
pub struct Watcher {
    config: Config,
    feed: FeedClient,
    cache: EventCache,
    classifier: Classifier,
    coordinator: ResetCoordinator,
    last_refresh: NaiveDateTime,
}

impl Watcher {
    /// Construct all collaborators from configuration and perform the
    /// initial classification and spawn reconciliation.
    ///
    /// # Errors
    ///
    /// Any collaborator that cannot be constructed is fatal here, before
    /// the loop starts. An unreachable feed is not: the watcher starts
    /// with empty categories and retries on the next refresh cycle.
    pub async fn connect(config: Config) -> Result<Self> {
        let scanner = scanner::backend_from_config(&config.scanner)?;
        let notifier = Notifier::from_config(&config)?;
        let quest_policy = config
            .quest_reset
            .policy()
            .map_err(|e| Error::config(e.to_string()))?;

        let settings = CoordinatorSettings {
            monster_strategy: config.monster_reset.strategy,
            quest_policy,
            delete_unknown_windows: config.watcher.delete_unknown_windows,
            utc_offset_hours: utc_offset_hours(),
        };

        let now = local_now();
        let coordinator = ResetCoordinator::new(scanner, notifier, settings, now);
        let feed = FeedClient::new(config.watcher.feed_url.clone())?;
        let cache = EventCache::new(config.watcher.cache_path.clone());
        let classifier = Classifier::new(config.quest_reset.exclude_events.clone());

        let mut watcher = Self {
            config,
            feed,
            cache,
            classifier,
            coordinator,
            last_refresh: now,
        };
        watcher.refresh(now).await;
        Ok(watcher)
    }

    /// Assemble a watcher from prebuilt collaborators, for tests
    pub fn from_parts(
        config: Config,
        feed: FeedClient,
        cache: EventCache,
        classifier: Classifier,
        coordinator: ResetCoordinator,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            config,
            feed,
            cache,
            classifier,
            coordinator,
            last_refresh: now,
        }
    }

    /// Refetch the feed, reclassify, rewrite the cache and reconcile
    /// spawn windows.
    pub async fn refresh(&mut self, now: NaiveDateTime) {
        tracing::info!(url = %self.feed.url(), "refreshing event feed");
        let categories = match self.feed.fetch().await {
            Ok(raw) => self.classifier.classify(&raw, now),
            Err(err) => {
                // the feed being down wipes the known categories until the
                // next successful refresh; pending transitions are lost
                tracing::warn!(
                    %err,
                    dropped = self.coordinator.categories().len(),
                    "feed refresh failed, replacing known events with an empty list"
                );
                EventCategories::default()
            }
        };

        if let Err(err) = self.cache.write(&categories, now) {
            tracing::error!(
                %err,
                path = %self.cache.path().display(),
                "failed to update event cache"
            );
        }

        self.coordinator.replace_categories(categories);
        self.coordinator.reconcile_spawn_windows().await;
        self.last_refresh = now;
    }

    /// One pass of the loop body: transition checks first, then a feed
    /// refresh if the refresh interval has elapsed.
    pub async fn tick(&mut self, now: NaiveDateTime) {
        if self.config.monster_reset.enable {
            self.coordinator.check_monster_resets(now).await;
        }
        if self.config.quest_reset.enable {
            self.coordinator.check_quest_resets(now).await;
        }

        let refresh_due = now - self.last_refresh
            >= ChronoDuration::seconds(self.config.watcher.refresh_interval_secs as i64);
        if refresh_due {
            self.refresh(now).await;
        }
    }

    /// Coordinator state, for inspection in tests
    pub fn coordinator(&self) -> &ResetCoordinator {
        &self.coordinator
    }

    /// Run forever. Only a process-level signal stops the loop.
    pub async fn run(mut self) -> Result<()> {
        loop {
            self.tick(local_now()).await;
            tracing::debug!(seconds = TICK_INTERVAL.as_secs(), "sleeping until next tick");
            tokio::time::sleep(TICK_INTERVAL).await;
        }
    }
}
