use axum::{extract::State, Json};
use chrono::Local;
use serde_json::{json, Value};

use crate::web::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Local::now(),
        "openai_configured": state.gateway.is_configured(),
    }))
}
