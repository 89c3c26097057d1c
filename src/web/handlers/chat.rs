use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};

use super::error::AppError;
use crate::models::{ChatRequest, ChatResponse};
use crate::web::state::AppState;

/// Alternative to the `sessionId` body field
pub const SESSION_ID_HEADER: &str = "x-session-id";

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let header_session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = state.gateway.chat(request, header_session_id).await?;
    Ok(Json(response))
}
