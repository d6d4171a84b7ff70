//! Direct-database scanner backend
//!
//! Mutates the scanner's SQLite tables in place: `quest` and `monster`
//! hold the cached pools, `event` holds the per-category event windows.
//! Rescans are triggered by running a configured shell command, since the
//! database itself has no way to poke the scanner.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{ScannerBackend, ScannerError};
use crate::models::{RemoteWindow, DB_TIME_FORMAT};

/// Scanner backend writing to the scanner database directly
pub struct DatabaseBackend {
    conn: Mutex<Connection>,
    rescan_command: Option<String>,
}

impl DatabaseBackend {
    /// Open the scanner database at `path`.
    ///
    /// `rescan_command` is the shell command run by [`trigger_rescan`];
    /// without one, rescan requests are logged and skipped.
    ///
    /// [`trigger_rescan`]: ScannerBackend::trigger_rescan
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::Database` if the database cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        rescan_command: Option<String>,
    ) -> Result<Self, ScannerError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            rescan_command,
        })
    }

    /// Open an in-memory database, for tests
    pub fn open_in_memory(rescan_command: Option<String>) -> Result<Self, ScannerError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            rescan_command,
        })
    }

    /// Create the scanner tables if they do not exist yet.
    ///
    /// Production scanners own their schema; this exists for fresh
    /// installations and tests.
    pub fn ensure_schema(&self) -> Result<(), ScannerError> {
        let conn = self.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS quest (
                 quest_id INTEGER PRIMARY KEY,
                 pokestop_id TEXT,
                 collected_at TEXT
             );
             CREATE TABLE IF NOT EXISTS monster (
                 monster_id INTEGER PRIMARY KEY,
                 spawn_id TEXT,
                 last_modified TEXT NOT NULL,
                 disappear_time TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS event (
                 event_name TEXT PRIMARY KEY,
                 event_start TEXT NOT NULL,
                 event_end TEXT NOT NULL,
                 event_lure_duration INTEGER NOT NULL
             );",
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // a poisoned mutex means another thread panicked mid-statement;
        // the connection itself is still usable
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn parse_db_time(value: &str, row: &str) -> Result<NaiveDateTime, ScannerError> {
        NaiveDateTime::parse_from_str(value, DB_TIME_FORMAT)
            .map_err(|e| ScannerError::InvalidRow(format!("{row}: bad time '{value}': {e}")))
    }
}

#[async_trait]
impl ScannerBackend for DatabaseBackend {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn reset_all_quests(&self) -> Result<(), ScannerError> {
        let deleted = self.lock().execute("DELETE FROM quest", [])?;
        tracing::info!(deleted, "quest pool reset");
        Ok(())
    }

    async fn reset_all_monsters(&self) -> Result<(), ScannerError> {
        let deleted = self.lock().execute("DELETE FROM monster", [])?;
        tracing::info!(deleted, "monster pool reset");
        Ok(())
    }

    async fn reset_filtered_monsters(&self, cutoff_utc: NaiveDateTime) -> Result<(), ScannerError> {
        let cutoff = cutoff_utc.format(DB_TIME_FORMAT).to_string();
        let deleted = self.lock().execute(
            "DELETE FROM monster WHERE last_modified < ?1 AND disappear_time > ?1",
            params![cutoff],
        )?;
        tracing::info!(deleted, %cutoff, "monster pool reset (filtered)");
        Ok(())
    }

    async fn list_event_windows(&self) -> Result<Vec<RemoteWindow>, ScannerError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT event_name, event_start, event_end FROM event")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut windows = Vec::new();
        for row in rows {
            let (name, start, end) = row?;
            windows.push(RemoteWindow {
                start: Self::parse_db_time(&start, &name)?,
                end: Self::parse_db_time(&end, &name)?,
                name,
            });
        }
        Ok(windows)
    }

    async fn insert_event_window(&self, name: &str) -> Result<(), ScannerError> {
        let placeholder = crate::models::placeholder_window_time()
            .format(DB_TIME_FORMAT)
            .to_string();
        self.lock().execute(
            "INSERT INTO event (event_name, event_start, event_end, event_lure_duration)
             VALUES (?1, ?2, ?2, ?3)",
            params![name, placeholder, crate::models::DEFAULT_LURE_MINUTES],
        )?;
        tracing::info!(window = name, "event window inserted");
        Ok(())
    }

    async fn update_event_window(
        &self,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        lure_minutes: i64,
    ) -> Result<(), ScannerError> {
        self.lock().execute(
            "UPDATE event SET event_start = ?2, event_end = ?3, event_lure_duration = ?4
             WHERE event_name = ?1",
            params![
                name,
                start.format(DB_TIME_FORMAT).to_string(),
                end.format(DB_TIME_FORMAT).to_string(),
                lure_minutes
            ],
        )?;
        tracing::info!(
            window = name,
            start = %start,
            end = %end,
            lure_minutes,
            "event window updated"
        );
        Ok(())
    }

    async fn delete_event_window(&self, name: &str) -> Result<(), ScannerError> {
        self.lock()
            .execute("DELETE FROM event WHERE event_name = ?1", params![name])?;
        tracing::info!(window = name, "event window deleted");
        Ok(())
    }

    async fn trigger_rescan(&self) -> Result<(), ScannerError> {
        let Some(command) = &self.rescan_command else {
            self.log_unsupported("trigger_rescan");
            return Ok(());
        };

        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .await?;

        if status.success() {
            tracing::debug!(%command, "rescan trigger command succeeded");
            Ok(())
        } else {
            Err(ScannerError::Command {
                command: command.clone(),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}
