use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {source}")]
    NetworkError { source: reqwest::Error },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

/// Error fields of an OpenAI error body: `{"error": {"message", "type", "code"}}`
struct ErrorDetails {
    message: String,
    code: Option<String>,
}

impl ErrorDetails {
    fn parse(body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body)
            .to_string();
        let code = error
            .and_then(|e| e.get("code").or_else(|| e.get("type")))
            .and_then(|c| c.as_str())
            .map(str::to_string);

        Self { message, code }
    }

    fn mentions_invalid_key(&self) -> bool {
        let message = self.message.to_lowercase();
        self.code.as_deref() == Some("invalid_api_key")
            || message.contains("invalid_api_key")
            || message.contains("incorrect api key")
            || message.contains("invalid api key")
    }
}

impl OpenAiError {
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, OpenAiError::AuthenticationFailed { .. })
    }

    pub fn is_rate_limit_error(&self) -> bool {
        matches!(self, OpenAiError::RateLimitExceeded { .. })
    }

    pub fn is_timeout_error(&self) -> bool {
        matches!(self, OpenAiError::Timeout { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, OpenAiError::ServerError { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            OpenAiError::AuthenticationFailed { .. } => {
                "OpenAI API key is invalid or expired. Please check your credentials and try again."
                    .to_string()
            }
            OpenAiError::RateLimitExceeded { .. } => {
                "OpenAI API rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            OpenAiError::QuotaExceeded { .. } => {
                "OpenAI API quota exceeded. Please check your plan and billing details.".to_string()
            }
            OpenAiError::Timeout { .. } => {
                "Request to OpenAI timed out. Please try again.".to_string()
            }
            OpenAiError::NetworkError { .. } => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            OpenAiError::InvalidRequest { message } => format!("Invalid request: {message}"),
            OpenAiError::ServerError { .. } => {
                "OpenAI service is experiencing issues. Please try again later.".to_string()
            }
            OpenAiError::ParseError { .. } | OpenAiError::InvalidResponse { .. } => {
                "Received invalid response from OpenAI. Please try again.".to_string()
            }
            OpenAiError::ConfigurationError { message } => {
                format!("Configuration error: {message}")
            }
        }
    }

    pub fn from_reqwest_error(error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            OpenAiError::Timeout { timeout_ms }
        } else if error.is_decode() {
            OpenAiError::ParseError {
                message: error.to_string(),
            }
        } else {
            OpenAiError::NetworkError { source: error }
        }
    }

    pub fn from_status_and_body(status: reqwest::StatusCode, body: &str) -> Self {
        let status_code = status.as_u16();
        let details = ErrorDetails::parse(body);

        if status_code == 401 || details.mentions_invalid_key() {
            return OpenAiError::AuthenticationFailed {
                message: details.message,
            };
        }

        match status_code {
            400 | 404 | 422 => OpenAiError::InvalidRequest {
                message: details.message,
            },
            403 => OpenAiError::AuthenticationFailed {
                message: details.message,
            },
            429 => {
                if details.code.as_deref() == Some("insufficient_quota") {
                    OpenAiError::QuotaExceeded {
                        message: details.message,
                    }
                } else {
                    OpenAiError::RateLimitExceeded {
                        message: details.message,
                    }
                }
            }
            500..=599 => OpenAiError::ServerError {
                status: status_code,
                message: details.message,
            },
            _ => OpenAiError::InvalidRequest {
                message: format!("HTTP {status_code}: {}", details.message),
            },
        }
    }
}
