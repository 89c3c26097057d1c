use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::GatewayError;

/// Error half of every handler; rendered as `{"error": message}`
#[derive(Debug)]
pub enum AppError {
    /// Request rejected before it reached the gateway
    BadRequest(String),
    Gateway(GatewayError),
}

impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        AppError::Gateway(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Gateway(error) => (error.status_code(), error.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
