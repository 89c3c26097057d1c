use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AppError;
use crate::logging::log_audit;
use crate::web::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopSessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStopped {
    pub status: String,
    pub timestamp: DateTime<Local>,
}

pub async fn start_session(State(state): State<AppState>) -> Result<Json<SessionStarted>, AppError> {
    let session = state.session_log.start_session()?;
    let session_id = session.session_id.clone();
    state.sessions.insert(session);
    log_audit("session_start", None, Some(&session_id), "start");

    Ok(Json(SessionStarted {
        session_id,
        timestamp: Local::now(),
    }))
}

/// An empty body stops the most recently started session
pub async fn stop_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionStopped>, AppError> {
    let request: StopSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StopSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid session stop body: {e}")))?
    };

    let session_id = request.session_id.filter(|id| !id.is_empty());
    let active = state.sessions.take(session_id.as_deref());

    let entry = state
        .session_log
        .stop_session(active.as_ref(), session_id, request.metrics)?;
    log_audit("session_stop", None, entry.session_id(), "stop");

    Ok(Json(SessionStopped {
        status: "stopped".to_string(),
        timestamp: Local::now(),
    }))
}
