//! Event classification
//!
//! Turns raw feed records into validated [`GameEvent`] values and partitions
//! them into the four category views the coordinator consumes: all events,
//! monster-pool events, quest events and spawn events. Malformed or already
//! ended records are dropped silently; they are simply not current events.

use chrono::NaiveDateTime;

use crate::feed::RawEvent;
use crate::models::{
    sort_by_start, GameEvent, DEFAULT_BONUS_LURE_MINUTES, FEED_TIME_FORMAT,
};

/// Kind tags that always change the monster spawn pool, independent of the
/// record's spawn list
const POOL_CHANGING_KINDS: [&str; 2] = ["spotlight-hour", "community-day"];

/// Bonus template tag marking an extended lure duration
const LONGER_LURE_TEMPLATE: &str = "longer-lure";

/// The four category views, each sorted ascending by start time with
/// unknown starts last. Rebuilt wholesale on every feed refresh.
#[derive(Debug, Clone, Default)]
pub struct EventCategories {
    /// Every current event
    pub all: Vec<GameEvent>,

    /// Events changing the monster spawn pool
    pub monster: Vec<GameEvent>,

    /// Events changing the quest pool, minus configured exclusions
    pub quest: Vec<GameEvent>,

    /// Events changing active spawnpoints
    pub spawn: Vec<GameEvent>,
}

impl EventCategories {
    /// Total number of current events
    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Build a [`GameEvent`] from one raw feed record.
///
/// Returns `None` for records without a kind tag or end time. An unknown
/// start time is accepted; such events can still end-trigger.
pub fn event_from_raw(raw: &RawEvent) -> Option<GameEvent> {
    let kind = raw.kind.clone()?;
    let end = parse_feed_time(raw.end.as_deref()?)?;
    let start = match raw.start.as_deref() {
        Some(s) => Some(parse_feed_time(s)?),
        None => None,
    };

    // first longer-lure bonus wins; a marker without a value means 3 hours
    let lure_duration_minutes = raw
        .bonuses
        .iter()
        .find(|b| b.template == LONGER_LURE_TEMPLATE)
        .map(|b| match b.value {
            Some(hours) => (hours * 60.0) as i64,
            None => DEFAULT_BONUS_LURE_MINUTES,
        });

    let affects_monsters =
        POOL_CHANGING_KINDS.contains(&kind.as_str()) || !raw.spawns.is_empty();

    Some(GameEvent {
        name: raw.name.clone(),
        kind,
        start,
        end,
        affects_spawnpoints: raw.has_spawnpoints,
        affects_quests: raw.has_quests,
        affects_monsters,
        lure_duration_minutes,
    })
}

fn parse_feed_time(s: &str) -> Option<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(s, FEED_TIME_FORMAT) {
        Ok(t) => Some(t),
        Err(err) => {
            tracing::warn!(value = %s, %err, "unparsable time in feed record");
            None
        }
    }
}

/// Classifier turning raw feed records into [`EventCategories`]
pub struct Classifier {
    /// Case-insensitive name substrings excluded from the quest category
    quest_excludes: Vec<String>,
}

impl Classifier {
    pub fn new(quest_excludes: Vec<String>) -> Self {
        Self { quest_excludes }
    }

    /// Classify raw records into category views.
    ///
    /// `now` is the current local wall-clock instant; records whose end
    /// already passed are dropped.
    pub fn classify(&self, raw_events: &[RawEvent], now: NaiveDateTime) -> EventCategories {
        let mut categories = EventCategories::default();

        for raw in raw_events {
            let Some(event) = event_from_raw(raw) else {
                tracing::debug!(name = %raw.name, "dropped malformed feed record");
                continue;
            };
            if event.end < now {
                continue;
            }

            if event.affects_spawnpoints {
                categories.spawn.push(event.clone());
            }
            if event.affects_quests && !self.is_quest_excluded(&event.name) {
                categories.quest.push(event.clone());
            }
            if event.affects_monsters {
                categories.monster.push(event.clone());
            }
            categories.all.push(event);
        }

        sort_by_start(&mut categories.all);
        sort_by_start(&mut categories.monster);
        sort_by_start(&mut categories.quest);
        sort_by_start(&mut categories.spawn);

        tracing::info!(
            all = categories.all.len(),
            monster = categories.monster.len(),
            quest = categories.quest.len(),
            spawn = categories.spawn.len(),
            "classified event feed"
        );
        categories
    }

    fn is_quest_excluded(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        for exclude in &self.quest_excludes {
            if lower.contains(&exclude.to_lowercase()) {
                tracing::info!(event = %name, matched = %exclude, "excluded from quest category");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RawBonus;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 1, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn raw(name: &str, kind: Option<&str>, start: Option<&str>, end: Option<&str>) -> RawEvent {
        RawEvent {
            name: name.to_string(),
            kind: kind.map(String::from),
            start: start.map(String::from),
            end: end.map(String::from),
            has_spawnpoints: false,
            has_quests: false,
            spawns: Vec::new(),
            bonuses: Vec::new(),
        }
    }

    #[test]
    fn test_missing_kind_or_end_dropped() {
        assert!(event_from_raw(&raw("a", None, None, Some("2010-01-02 00:00"))).is_none());
        assert!(event_from_raw(&raw("b", Some("event"), None, None)).is_none());
    }

    #[test]
    fn test_unknown_start_accepted() {
        let event = event_from_raw(&raw("a", Some("event"), None, Some("2010-01-02 00:00")))
            .expect("event without start is valid");
        assert!(event.start.is_none());
        assert_eq!(event.end, dt(2, 0, 0));
    }

    #[test]
    fn test_pool_changing_kind_sets_monster_flag() {
        // Scenario: community-day with empty spawn list still changes the pool
        let event = event_from_raw(&raw(
            "CD",
            Some("community-day"),
            Some("2010-01-01 10:00"),
            Some("2010-01-01 12:00"),
        ))
        .unwrap();
        assert!(event.affects_monsters);
    }

    #[test]
    fn test_spawn_list_sets_monster_flag() {
        // Scenario: plain event with a non-empty spawn list changes the pool
        let mut r = raw(
            "Season Kickoff",
            Some("event"),
            Some("2010-01-01 10:00"),
            Some("2010-01-01 12:00"),
        );
        r.spawns = vec![serde_json::json!({"id": 1})];
        let event = event_from_raw(&r).unwrap();
        assert!(event.affects_monsters);

        r.spawns = Vec::new();
        let event = event_from_raw(&r).unwrap();
        assert!(!event.affects_monsters);
    }

    #[test]
    fn test_lure_bonus_first_match_wins() {
        let mut r = raw(
            "Lure Fest",
            Some("event"),
            Some("2010-01-01 10:00"),
            Some("2010-01-01 12:00"),
        );
        r.bonuses = vec![
            RawBonus {
                template: "incense".to_string(),
                value: Some(1.0),
            },
            RawBonus {
                template: "longer-lure".to_string(),
                value: Some(1.0),
            },
            RawBonus {
                template: "longer-lure".to_string(),
                value: Some(6.0),
            },
        ];
        let event = event_from_raw(&r).unwrap();
        assert_eq!(event.lure_duration_minutes, Some(60));
    }

    #[test]
    fn test_lure_bonus_without_value_defaults_to_three_hours() {
        let mut r = raw(
            "Lure Fest",
            Some("event"),
            None,
            Some("2010-01-01 12:00"),
        );
        r.bonuses = vec![RawBonus {
            template: "longer-lure".to_string(),
            value: None,
        }];
        let event = event_from_raw(&r).unwrap();
        assert_eq!(event.lure_duration_minutes, Some(180));
    }

    #[test]
    fn test_ended_events_dropped() {
        let classifier = Classifier::new(Vec::new());
        let records = vec![
            raw("Past", Some("event"), None, Some("2010-01-01 08:00")),
            raw("Current", Some("event"), None, Some("2010-01-01 18:00")),
        ];
        let categories = classifier.classify(&records, dt(1, 12, 0));

        assert_eq!(categories.all.len(), 1);
        assert_eq!(categories.all[0].name, "Current");
    }

    #[test]
    fn test_quest_exclusion_case_insensitive() {
        let classifier = Classifier::new(vec!["GO Rocket".to_string()]);
        let mut rocket = raw(
            "Team go rocket Takeover",
            Some("event"),
            Some("2010-01-01 10:00"),
            Some("2010-01-02 10:00"),
        );
        rocket.has_quests = true;
        let mut plain = raw(
            "Lunar Festival",
            Some("event"),
            Some("2010-01-01 10:00"),
            Some("2010-01-02 10:00"),
        );
        plain.has_quests = true;

        let categories = classifier.classify(&[rocket, plain], dt(1, 0, 0));

        // excluded from quests only; still present in the all view
        assert_eq!(categories.quest.len(), 1);
        assert_eq!(categories.quest[0].name, "Lunar Festival");
        assert_eq!(categories.all.len(), 2);
    }

    #[test]
    fn test_categories_sorted_unknown_start_last() {
        let classifier = Classifier::new(Vec::new());
        let records = vec![
            raw("No Start", Some("event"), None, Some("2010-01-03 00:00")),
            raw(
                "Later",
                Some("event"),
                Some("2010-01-02 00:00"),
                Some("2010-01-03 00:00"),
            ),
            raw(
                "Earlier",
                Some("event"),
                Some("2010-01-01 06:00"),
                Some("2010-01-03 00:00"),
            ),
        ];
        let categories = classifier.classify(&records, dt(1, 0, 0));

        let names: Vec<&str> = categories.all.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Earlier", "Later", "No Start"]);
    }
}
