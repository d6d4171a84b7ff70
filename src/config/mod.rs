//! Configuration management for the event watcher
//!
//! Settings are loaded from a TOML file and validated before the polling
//! loop starts: an enabled feature with missing settings is a startup
//! error, never a runtime surprise.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feed::DEFAULT_FEED_URL;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Polling loop settings
    pub watcher: WatcherConfig,

    /// Monster pool reset settings
    pub monster_reset: MonsterResetConfig,

    /// Quest pool reset settings
    pub quest_reset: QuestResetConfig,

    /// Scanner backend settings
    pub scanner: ScannerConfig,

    /// Telegram notification settings
    pub telegram: TelegramConfig,

    /// Discord notification settings
    pub discord: DiscordConfig,
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Event feed URL
    pub feed_url: String,

    /// Seconds between feed refreshes (transition checks run on their own
    /// fixed fast cadence, independent of this)
    pub refresh_interval_secs: u64,

    /// Path of the event cache file
    pub cache_path: PathBuf,

    /// Language key for notification templates (en, de)
    pub language: String,

    /// Delete scanner event windows that the watcher does not manage
    pub delete_unknown_windows: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            refresh_interval_secs: 3600,
            cache_path: PathBuf::from(".eventcache"),
            language: "en".to_string(),
            delete_unknown_windows: false,
        }
    }
}

/// How the monster pool is cleared on a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterResetStrategy {
    /// Clear the whole pool
    #[default]
    All,

    /// Remove only entries last refreshed before the boundary instant and
    /// not yet expired
    Filtered,
}

/// Monster pool reset configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterResetConfig {
    pub enable: bool,
    pub strategy: MonsterResetStrategy,
}

/// Quest pool reset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestResetConfig {
    pub enable: bool,

    /// Event kinds that trigger quest resets. Each entry is a kind tag,
    /// optionally suffixed with `:start` or `:end` to react to only one
    /// boundary (`"event"`, `"community-day:start"`).
    pub react_to: Vec<String>,

    /// Case-insensitive name substrings excluded from quest resets
    pub exclude_events: Vec<String>,

    /// Daily hour window (`"5-21"`) in which quest rescans actually run;
    /// only used to phrase operator notifications
    pub rescan_window: String,
}

impl Default for QuestResetConfig {
    fn default() -> Self {
        Self {
            enable: false,
            react_to: vec!["event".to_string()],
            exclude_events: Vec::new(),
            rescan_window: "5-21".to_string(),
        }
    }
}

impl QuestResetConfig {
    /// Parse the `react_to` entries into a lookup policy
    pub fn policy(&self) -> Result<QuestResetPolicy> {
        QuestResetPolicy::parse(&self.react_to).map_err(|e| anyhow::anyhow!(e))
    }
}

/// Scanner backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Backend flavor: `database`, `api` or `composite`
    pub backend: String,

    /// Scanner database path (database and composite backends)
    pub database_path: PathBuf,

    /// Shell command triggering a rescan (database backend)
    pub rescan_command: Option<String>,

    /// Management API base URL (api and composite backends)
    pub api_url: String,

    /// Management API bearer token
    pub api_token: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            backend: "database".to_string(),
            database_path: PathBuf::from("scanner.db"),
            rescan_command: None,
            api_url: String::new(),
            api_token: None,
        }
    }
}

/// Telegram notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enable: bool,
    pub bot_token: String,
    pub chat_ids: Vec<String>,
}

/// Discord notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub enable: bool,
    pub webhook_urls: Vec<String>,
    pub username: String,
    pub embed_title: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            enable: false,
            webhook_urls: Vec::new(),
            username: "Event Watch Bot".to_string(),
            embed_title: "Event quest notification".to_string(),
        }
    }
}

/// Which boundaries of an event kind trigger quest resets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSet {
    pub on_start: bool,
    pub on_end: bool,
}

impl EdgeSet {
    pub const BOTH: EdgeSet = EdgeSet {
        on_start: true,
        on_end: true,
    };
    pub const NONE: EdgeSet = EdgeSet {
        on_start: false,
        on_end: false,
    };
}

/// Lookup from event kind to the boundaries it reacts to.
///
/// Kinds not listed never trigger a quest reset.
#[derive(Debug, Clone, Default)]
pub struct QuestResetPolicy {
    entries: HashMap<String, EdgeSet>,
}

impl QuestResetPolicy {
    /// Parse entries of the form `kind`, `kind:start` or `kind:end`.
    ///
    /// An unknown suffix falls back to reacting on both boundaries.
    pub fn parse(entries: &[String]) -> std::result::Result<Self, String> {
        let mut map = HashMap::new();
        for raw in entries {
            let raw = raw.trim();
            let (kind, edges) = match raw.split_once(':') {
                Some((kind, spec)) => {
                    let edges = if spec.contains("start") {
                        EdgeSet {
                            on_start: true,
                            on_end: false,
                        }
                    } else if spec.contains("end") {
                        EdgeSet {
                            on_start: false,
                            on_end: true,
                        }
                    } else {
                        EdgeSet::BOTH
                    };
                    (kind.trim(), edges)
                }
                None => (raw, EdgeSet::BOTH),
            };
            if kind.is_empty() {
                return Err(format!("empty event kind in react_to entry '{raw}'"));
            }
            map.insert(kind.to_string(), edges);
        }
        Ok(Self { entries: map })
    }

    /// Boundaries configured for `kind`
    pub fn edges_for(&self, kind: &str) -> EdgeSet {
        self.entries.get(kind).copied().unwrap_or(EdgeSet::NONE)
    }
}

/// Daily hour window in which quest rescans run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescanWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl RescanWindow {
    /// Parse the `"HH-HH"` pattern
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(format!("rescan_window '{s}' does not match the HH-HH pattern"));
        }
        let start_hour: u32 = parts[0]
            .trim()
            .parse()
            .map_err(|_| format!("rescan_window '{s}': bad start hour"))?;
        let end_hour: u32 = parts[1]
            .trim()
            .parse()
            .map_err(|_| format!("rescan_window '{s}': bad end hour"))?;
        if start_hour > 23 || end_hour > 23 {
            return Err(format!("rescan_window '{s}': hours must be 0-23"));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Enabled features with incomplete settings fail here, before the
    /// loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than 0");
        }
        if self.watcher.feed_url.is_empty() {
            bail!("feed_url must not be empty");
        }

        match self.scanner.backend.as_str() {
            "database" | "api" | "composite" => {}
            other => bail!("unknown scanner backend '{other}' (database, api, composite)"),
        }
        if self.scanner.backend != "database" && self.scanner.api_url.is_empty() {
            bail!("scanner backend '{}' requires api_url", self.scanner.backend);
        }

        if self.quest_reset.enable {
            self.quest_reset.policy()?;
        }

        if self.telegram.enable {
            if self.telegram.bot_token.is_empty() {
                bail!("telegram enabled without bot_token");
            }
            if self.telegram.chat_ids.is_empty() {
                bail!("telegram enabled without chat_ids");
            }
            RescanWindow::parse(&self.quest_reset.rescan_window)
                .map_err(|e| anyhow::anyhow!(e))?;
        }

        if self.discord.enable && self.discord.webhook_urls.is_empty() {
            bail!("discord enabled without webhook_urls");
        }

        Ok(())
    }

    /// Feed refresh interval as a Duration
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.watcher.refresh_interval_secs)
    }
}
