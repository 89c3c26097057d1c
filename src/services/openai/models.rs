use serde::{Deserialize, Serialize};

use crate::models::{ConversationMessage, TokenUsage};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: Option<u32>,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CompletionUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

impl ChatCompletionRequest {
    /// Appends `message` as the newest user turn after `history`
    pub fn new(model: impl Into<String>, history: Vec<ConversationMessage>, message: &str) -> Self {
        let mut messages = history;
        messages.push(ConversationMessage::user(message));
        Self {
            model: model.into(),
            messages,
        }
    }
}

impl ChatCompletionResponse {
    /// Text of the first choice; `None` when the provider returned no choices
    pub fn extract_text(&self) -> Option<String> {
        self.choices
            .first()
            .map(|choice| choice.message.content.clone().unwrap_or_default())
    }

    /// Token counts, absent counters read as zero
    pub fn token_usage(&self, model: &str) -> TokenUsage {
        let usage = self.usage.clone().unwrap_or_default();
        TokenUsage {
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
            total_tokens: usage.total_tokens.unwrap_or(0),
            model: model.to_string(),
        }
    }
}
