//! Core data structures and transition detection
//!
//! [`GameEvent`] is the immutable value object built from one raw feed
//! record. [`TickWindow`] carries the half-open interval between two polling
//! samples; an event "transitions" when its start or end boundary falls
//! inside that interval. [`RemoteWindow`] mirrors one event-window row in
//! the scanner's system of record.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Time format used by the event feed (local wall-clock, minute resolution)
pub const FEED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Time format used by the scanner database
pub const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lure duration pushed to the scanner when an event carries no bonus
pub const DEFAULT_LURE_MINUTES: i64 = 30;

/// Lure duration assumed when the longer-lure bonus carries no explicit value
pub const DEFAULT_BONUS_LURE_MINUTES: i64 = 180;

/// Event window names the scanner is expected to know about.
///
/// `DEFAULT` is permanent and never written by reconciliation; `Others`
/// collects every event kind without a dedicated window.
pub const KNOWN_BUCKETS: [&str; 5] = [
    "Community Days",
    "Spotlight Hours",
    "Regular Events",
    "DEFAULT",
    "Others",
];

/// Map an event kind tag to its scanner window name.
///
/// The kind tag is an open set: the feed may introduce new tags at any
/// time, and they all land in the `Others` window.
pub fn bucket_for_kind(kind: &str) -> &'static str {
    match kind {
        "community-day" => "Community Days",
        "spotlight-hour" => "Spotlight Hours",
        "event" => "Regular Events",
        "default" => "DEFAULT",
        _ => "Others",
    }
}

/// Placeholder start/end written for freshly inserted event windows.
///
/// Far enough in the future that the window stays inactive until the first
/// reconciliation pass overwrites it with real event times.
pub fn placeholder_window_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("static placeholder date is valid")
}

/// The interval between two consecutive polling samples.
///
/// Containment is left-open, right-closed: a boundary exactly at `to`
/// fires on this tick, and cannot fire again on the next tick because the
/// next window starts (exclusively) at this window's `to`. Contiguous
/// windows therefore partition time with no gap and no overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TickWindow {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// True iff `instant` lies in `(from, to]`
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from < instant && instant <= self.to
    }
}

/// One time-boxed game event and the state it affects.
///
/// Built fresh from the raw feed on every refresh and never mutated; edge
/// detection state lives in the coordinator's checkpoints, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Display name from the feed
    pub name: String,

    /// Open-set category tag (`community-day`, `spotlight-hour`, ...)
    pub kind: String,

    /// Local start time; `None` means not yet scheduled. An event without
    /// a start can never fire a start transition but still fires its end.
    pub start: Option<NaiveDateTime>,

    /// Local end time, always known
    pub end: NaiveDateTime,

    /// Event changes which spawnpoints are active
    pub affects_spawnpoints: bool,

    /// Event changes the quest pool
    pub affects_quests: bool,

    /// Event changes the monster spawn pool (derived from kind and spawns)
    pub affects_monsters: bool,

    /// Lure duration in minutes from a longer-lure bonus, if any
    pub lure_duration_minutes: Option<i64>,
}

impl GameEvent {
    /// Did this event start within the given polling window?
    pub fn started_within(&self, window: &TickWindow) -> bool {
        match self.start {
            Some(start) => window.contains(start),
            None => false,
        }
    }

    /// Did this event end within the given polling window?
    pub fn ended_within(&self, window: &TickWindow) -> bool {
        window.contains(self.end)
    }

    /// Scanner window name this event reconciles into
    pub fn bucket_name(&self) -> &'static str {
        bucket_for_kind(&self.kind)
    }
}

/// Sort events ascending by start time, unknown starts last.
///
/// Unknown-start events can never start-trigger, so their relative order
/// is irrelevant; the sort is stable, keeping feed order among them.
pub fn sort_by_start(events: &mut [GameEvent]) {
    events.sort_by_key(|e| (e.start.is_none(), e.start));
}

/// One event-window row in the scanner's system of record
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteWindow {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn event(start: Option<NaiveDateTime>, end: NaiveDateTime) -> GameEvent {
        GameEvent {
            name: "Test Event".to_string(),
            kind: "event".to_string(),
            start,
            end,
            affects_spawnpoints: false,
            affects_quests: true,
            affects_monsters: false,
            lure_duration_minutes: None,
        }
    }

    #[test]
    fn test_window_left_open_right_closed() {
        let window = TickWindow::new(dt(2010, 1, 1, 9, 0), dt(2010, 1, 1, 10, 0));

        assert!(!window.contains(dt(2010, 1, 1, 9, 0)), "left edge excluded");
        assert!(window.contains(dt(2010, 1, 1, 9, 30)));
        assert!(window.contains(dt(2010, 1, 1, 10, 0)), "right edge included");
        assert!(!window.contains(dt(2010, 1, 1, 10, 1)));
    }

    #[test]
    fn test_zero_width_window_never_fires() {
        let instant = dt(2010, 1, 1, 10, 0);
        let window = TickWindow::new(instant, instant);
        let e = event(Some(instant), dt(2010, 1, 1, 12, 0));

        assert!(!e.started_within(&window));
        assert!(!event(None, instant).ended_within(&window));
    }

    #[test]
    fn test_unknown_start_never_starts() {
        let window = TickWindow::new(dt(2010, 1, 1, 0, 0), dt(2010, 1, 2, 0, 0));
        let e = event(None, dt(2010, 1, 1, 12, 0));

        assert!(!e.started_within(&window));
        assert!(e.ended_within(&window), "end transition still fires");
    }

    #[test]
    fn test_consecutive_windows_no_double_fire() {
        let boundary = dt(2010, 1, 1, 10, 0);
        let first = TickWindow::new(dt(2010, 1, 1, 9, 59), boundary);
        let second = TickWindow::new(boundary, dt(2010, 1, 1, 10, 1));
        let e = event(Some(boundary), dt(2010, 1, 1, 12, 0));

        assert!(e.started_within(&first));
        assert!(!e.started_within(&second));
    }

    #[test]
    fn test_bucket_for_kind() {
        assert_eq!(bucket_for_kind("community-day"), "Community Days");
        assert_eq!(bucket_for_kind("spotlight-hour"), "Spotlight Hours");
        assert_eq!(bucket_for_kind("event"), "Regular Events");
        assert_eq!(bucket_for_kind("default"), "DEFAULT");
        assert_eq!(bucket_for_kind("raid-battles"), "Others");
        assert_eq!(bucket_for_kind(""), "Others");
    }

    #[test]
    fn test_sort_unknown_start_last() {
        let mut events = vec![
            event(None, dt(2010, 1, 5, 0, 0)),
            event(Some(dt(2010, 1, 2, 0, 0)), dt(2010, 1, 5, 0, 0)),
            event(Some(dt(2010, 1, 1, 0, 0)), dt(2010, 1, 5, 0, 0)),
        ];
        sort_by_start(&mut events);

        assert_eq!(events[0].start, Some(dt(2010, 1, 1, 0, 0)));
        assert_eq!(events[1].start, Some(dt(2010, 1, 2, 0, 0)));
        assert_eq!(events[2].start, None);
    }

    proptest! {
        /// Across any sequence of contiguous windows covering the event's
        /// lifetime, each boundary fires exactly once.
        #[test]
        fn prop_each_boundary_fires_exactly_once(
            start_min in 0i64..500,
            len_min in 1i64..500,
            cuts in proptest::collection::vec(1i64..1100, 1..20),
        ) {
            let base = dt(2010, 1, 1, 0, 0);
            let start = base + chrono::Duration::minutes(start_min);
            let end = start + chrono::Duration::minutes(len_min);
            let e = event(Some(start), end);

            // build contiguous windows from sorted cut points around [0, 1100]
            let mut edges: Vec<i64> = cuts;
            edges.push(0);
            edges.push(1100);
            edges.sort_unstable();
            edges.dedup();

            let mut start_fires = 0;
            let mut end_fires = 0;
            for pair in edges.windows(2) {
                let window = TickWindow::new(
                    base + chrono::Duration::minutes(pair[0]),
                    base + chrono::Duration::minutes(pair[1]),
                );
                if e.started_within(&window) {
                    start_fires += 1;
                }
                if e.ended_within(&window) {
                    end_fires += 1;
                }
            }

            // boundaries at minute 0 sit on the very first window's open
            // left edge and are legitimately outside every window
            let start_covered = start_min > 0;
            let end_covered = start_min + len_min > 0;
            prop_assert_eq!(start_fires, i32::from(start_covered));
            prop_assert_eq!(end_fires, i32::from(end_covered));
        }
    }
}
