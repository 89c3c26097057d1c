use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::message::ConversationMessage;
use super::usage::TokenUsage;

/// File content attached to a chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttachedFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl AttachedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ConversationMessage>>,
    #[serde(default)]
    pub attached_files: Option<Vec<AttachedFile>>,
    /// Single-file form kept for older frontends
    #[serde(default)]
    pub attached_content: Option<String>,
    #[serde(default)]
    pub attached_filename: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "isGuest")]
    pub is_guest: Option<bool>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Attachments from either request form, `attached_files` taking precedence
    pub fn attachments(&self) -> Vec<AttachedFile> {
        match &self.attached_files {
            Some(files) if !files.is_empty() => files.clone(),
            _ => match self.attached_content.as_deref() {
                Some(content) if !content.is_empty() => vec![AttachedFile {
                    name: Some(
                        self.attached_filename
                            .clone()
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| "file".to_string()),
                    ),
                    content: Some(content.to_string()),
                }],
                _ => Vec::new(),
            },
        }
    }
}

/// Output of one completion call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResult {
    pub message: String,
    pub usage: TokenUsage,
}

/// Body returned by `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub message: String,
    pub usage: TokenUsage,
    pub timestamp: DateTime<Local>,
}
