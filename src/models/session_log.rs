use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One line of the daily session log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionLogEntry {
    ProjectInit {
        timestamp: DateTime<Local>,
        date: String,
        project_criteria: Value,
    },
    SessionStart {
        session_id: String,
        timestamp: DateTime<Local>,
        date: String,
    },
    SessionStop {
        session_id: Option<String>,
        timestamp: DateTime<Local>,
        date: String,
        duration_seconds: Option<f64>,
        metrics: Value,
    },
    Metric {
        session_id: Option<String>,
        metric_name: String,
        metric_value: Value,
        timestamp: DateTime<Local>,
        date: String,
    },
}

impl SessionLogEntry {
    pub fn project_init(criteria: Value, now: DateTime<Local>) -> Self {
        Self::ProjectInit {
            timestamp: now,
            date: date_string(&now),
            project_criteria: criteria,
        }
    }

    pub fn session_start(session: &ActiveSession) -> Self {
        Self::SessionStart {
            session_id: session.session_id.clone(),
            timestamp: session.started_at,
            date: date_string(&session.started_at),
        }
    }

    pub fn session_stop(
        session_id: Option<String>,
        duration_seconds: Option<f64>,
        metrics: Option<Value>,
        now: DateTime<Local>,
    ) -> Self {
        Self::SessionStop {
            session_id,
            timestamp: now,
            date: date_string(&now),
            duration_seconds,
            metrics: metrics
                .filter(|m| !m.is_null())
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    pub fn metric(
        session_id: Option<String>,
        metric_name: impl Into<String>,
        metric_value: Value,
        now: DateTime<Local>,
    ) -> Self {
        Self::Metric {
            session_id,
            metric_name: metric_name.into(),
            metric_value,
            timestamp: now,
            date: date_string(&now),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            SessionLogEntry::ProjectInit { .. } => "project_init",
            SessionLogEntry::SessionStart { .. } => "session_start",
            SessionLogEntry::SessionStop { .. } => "session_stop",
            SessionLogEntry::Metric { .. } => "metric",
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            SessionLogEntry::ProjectInit { timestamp, .. }
            | SessionLogEntry::SessionStart { timestamp, .. }
            | SessionLogEntry::SessionStop { timestamp, .. }
            | SessionLogEntry::Metric { timestamp, .. } => *timestamp,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            SessionLogEntry::ProjectInit { .. } => None,
            SessionLogEntry::SessionStart { session_id, .. } => Some(session_id),
            SessionLogEntry::SessionStop { session_id, .. }
            | SessionLogEntry::Metric { session_id, .. } => session_id.as_deref(),
        }
    }
}

/// A started session, held by the caller until it is stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: String,
    pub started_at: DateTime<Local>,
}

impl ActiveSession {
    pub fn starting_at(started_at: DateTime<Local>) -> Self {
        Self {
            session_id: format!("session_{}", started_at.format("%Y%m%d_%H%M%S")),
            started_at,
        }
    }

    /// Wall-clock seconds between start and `stopped_at`
    pub fn elapsed_seconds(&self, stopped_at: DateTime<Local>) -> f64 {
        let elapsed = stopped_at.signed_duration_since(self.started_at);
        elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0
    }
}

pub fn date_string(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d").to_string()
}
