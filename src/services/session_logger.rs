//! Daily append-only session audit log
//!
//! One newline-delimited JSON file per local calendar day,
//! `<log_dir>/session_<YYYY-MM-DD>.log`. Each append opens the file, writes a
//! single line and closes it again.

use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::models::{ActiveSession, SessionLogEntry};

#[derive(Debug, Clone)]
pub struct SessionLogWriter {
    log_dir: PathBuf,
}

impl SessionLogWriter {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log file for today
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file_path_for(Local::now().date_naive())
    }

    pub fn log_file_path_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir
            .join(format!("session_{}.log", date.format("%Y-%m-%d")))
    }

    /// Writes `entry` as one line to today's file, creating the directory on first use
    pub fn append(&self, entry: &SessionLogEntry) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.log_file_path_for(entry.timestamp().date_naive());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;

        tracing::debug!(
            event = entry.event_name(),
            session_id = ?entry.session_id(),
            path = %path.display(),
            "Appended session log entry"
        );
        Ok(())
    }

    pub fn start_session(&self) -> Result<ActiveSession> {
        let session = ActiveSession::starting_at(Local::now());
        self.append(&SessionLogEntry::session_start(&session))?;
        tracing::info!(session_id = %session.session_id, "Session started");
        Ok(session)
    }

    /// Writes a `session_stop` entry.
    ///
    /// The id is `session_id` when given, else the id of `active`. Duration is
    /// measured from `active`'s start and is `None` without one.
    pub fn stop_session(
        &self,
        active: Option<&ActiveSession>,
        session_id: Option<String>,
        metrics: Option<Value>,
    ) -> Result<SessionLogEntry> {
        let now = Local::now();
        let session_id = session_id.or_else(|| active.map(|s| s.session_id.clone()));
        let duration_seconds = active.map(|s| s.elapsed_seconds(now).max(0.0));

        let entry = SessionLogEntry::session_stop(session_id, duration_seconds, metrics, now);
        self.append(&entry)?;
        tracing::info!(
            session_id = ?entry.session_id(),
            duration_seconds = ?duration_seconds,
            "Session stopped"
        );
        Ok(entry)
    }

    pub fn log_project_init(&self, criteria: Value) -> Result<()> {
        self.append(&SessionLogEntry::project_init(criteria, Local::now()))
    }

    pub fn log_metric(
        &self,
        session_id: Option<String>,
        metric_name: &str,
        metric_value: Value,
    ) -> Result<()> {
        self.append(&SessionLogEntry::metric(
            session_id,
            metric_name,
            metric_value,
            Local::now(),
        ))
    }

    /// All entries recorded on `date`, in file order
    pub fn read_entries(&self, date: NaiveDate) -> Result<Vec<SessionLogEntry>> {
        let path = self.log_file_path_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        fs::read_to_string(&path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}

/// Most sessions the registry keeps; older unstopped sessions are evicted first
pub const MAX_ACTIVE_SESSIONS: usize = 64;

/// Sessions started over HTTP and not yet stopped, oldest first
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<VecDeque<ActiveSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session restarted within the same second replaces the earlier one.
    /// Past `MAX_ACTIVE_SESSIONS` the oldest session is dropped.
    pub fn insert(&self, session: ActiveSession) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|s| s.session_id != session.session_id);
        active.push_back(session);

        while active.len() > MAX_ACTIVE_SESSIONS {
            if let Some(evicted) = active.pop_front() {
                tracing::debug!(
                    session_id = %evicted.session_id,
                    "Evicted session that was never stopped"
                );
            }
        }
    }

    /// Removes the session with `session_id`, or the most recent one when no id is given
    pub fn take(&self, session_id: Option<&str>) -> Option<ActiveSession> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match session_id {
            Some(id) => active
                .iter()
                .position(|s| s.session_id == id)
                .and_then(|index| active.remove(index)),
            None => active.pop_back(),
        }
    }

    pub fn len(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
