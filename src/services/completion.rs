//! Completion client trait definition
//!
//! The chat gateway talks to the provider only through [`CompletionClient`], so
//! handlers can be exercised without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::openai::OpenAiError;
use crate::models::{ChatResult, ConversationMessage, TokenUsage};

pub const CONNECTION_TEST_PROMPT: &str = "Say 'Connection successful' if you can read this.";

/// A single chat turn to send upstream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    pub message: String,
    pub history: Vec<ConversationMessage>,
    /// Overrides the client's configured model
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Result of the liveness probe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionTest {
    Success {
        message: String,
        test_response: String,
        model: String,
        usage: TokenUsage,
    },
    Error {
        message: String,
        model: String,
    },
}

impl ConnectionTest {
    pub fn is_success(&self) -> bool {
        matches!(self, ConnectionTest::Success { .. })
    }
}

/// Account details derivable from the configured key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub api_key_prefix: Option<String>,
    pub model: String,
    pub status: String,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `request.message` after `request.history` and return the first completion
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResult, OpenAiError>;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;

    fn account_info(&self) -> AccountInfo;

    /// Sends a fixed canary prompt and reports whether the provider answered
    async fn test_connection(&self) -> ConnectionTest {
        let model = self.default_model().to_string();
        match self.complete(CompletionRequest::new(CONNECTION_TEST_PROMPT)).await {
            Ok(result) => ConnectionTest::Success {
                message: "OpenAI connection is working".to_string(),
                test_response: result.message,
                model,
                usage: result.usage,
            },
            Err(e) => ConnectionTest::Error {
                message: format!("OpenAI connection failed: {e}"),
                model,
            },
        }
    }
}
