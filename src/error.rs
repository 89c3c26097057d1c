use axum::http::StatusCode;
use thiserror::Error;

use crate::services::openai::OpenAiError;

/// Errors surfaced by the chat gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No usable credentials; chat features are disabled but the process keeps running
    #[error("{message}")]
    Configuration { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    /// The provider rejected the credentials
    #[error("{message}")]
    Auth { message: String },

    /// Any other upstream failure, message passed through
    #[error("{message}")]
    Provider { message: String },

    /// A side call (usage report, remote fetch) failed; logged, never returned to clients
    #[error("{message}")]
    BestEffort { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    pub fn best_effort<S: Into<String>>(message: S) -> Self {
        Self::BestEffort {
            message: message.into(),
        }
    }

    /// HTTP status the web layer answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Auth { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::Configuration { .. }
            | GatewayError::Provider { .. }
            | GatewayError::BestEffort { .. }
            | GatewayError::Io(_)
            | GatewayError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, GatewayError::Auth { .. })
    }
}

impl From<OpenAiError> for GatewayError {
    fn from(error: OpenAiError) -> Self {
        if error.is_authentication_error() {
            GatewayError::auth(error.user_message())
        } else if let OpenAiError::ConfigurationError { message } = error {
            GatewayError::Configuration { message }
        } else {
            GatewayError::provider(format!("OpenAI API error: {error}"))
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
