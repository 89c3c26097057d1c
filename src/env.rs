//! Environment variable constants used throughout the application
//!
//! This module centralizes all environment variable names to ensure consistency
//! and make it easier to manage configuration across the codebase.

/// Logging configuration
pub mod logging {
    /// Log level configuration (e.g., "debug", "info", "warn", "error")
    pub const LOG_LEVEL: &str = "ALCHAT_LOG_LEVEL";

    /// Log file path for file-based logging
    pub const LOG_FILE: &str = "ALCHAT_LOG_FILE";

    /// Disable colored output (follows the NO_COLOR standard)
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// OpenAI provider configuration
pub mod openai {
    /// API key used when the credential service has none
    pub const API_KEY: &str = "OPENAI_API_KEY";

    /// Chat model name
    pub const MODEL: &str = "OPENAI_MODEL";

    /// Base URL of the chat-completion API
    pub const BASE_URL: &str = "OPENAI_BASE_URL";

    /// Request timeout for completion calls (seconds)
    pub const TIMEOUT_SECS: &str = "OPENAI_TIMEOUT_SECS";
}

/// Remote credential and accounting service
pub mod credential_service {
    /// Base URL of the credential service
    pub const URL: &str = "PAPITA_API_URL";
}

/// Session audit log
pub mod session_log {
    /// Directory holding the daily `session_<date>.log` files
    pub const DIR: &str = "ALCHAT_SESSION_LOG_DIR";
}

/// HTTP server binding
pub mod server {
    pub const HOST: &str = "HOST";

    pub const PORT: &str = "PORT";
}

