//! Chat request coordination: validation, attachment merging, completion,
//! usage accounting and the external usage report.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::completion::{CompletionClient, CompletionRequest};
use super::usage::{UsageAccountant, UsageReport, UsageReporter};
use crate::error::{GatewayError, Result};
use crate::logging::log_audit;
use crate::models::{AttachedFile, ChatRequest, ChatResponse, CredentialsInfo};

pub const ATTACHMENT_SEPARATOR: &str = "\n\n---\n\n";
pub const SINGLE_ATTACHMENT_PROMPT: &str = "Please analyze the attached file.";
pub const MULTIPLE_ATTACHMENTS_PROMPT: &str = "Please compare and analyze the attached files.";
pub const GUEST_USERNAME: &str = "guest";

const NOT_CONFIGURED_MESSAGE: &str =
    "OpenAI service not configured. Please set OPENAI_API_KEY in .env file.";

/// Builds the prompt sent upstream.
///
/// Each attachment becomes a `[Attached file N: name]` block (1-based, in order);
/// the blocks are followed by `message`, or by a default instruction when the
/// message is empty.
pub fn merge_attachments(message: Option<&str>, attachments: &[AttachedFile]) -> String {
    let message = message.unwrap_or_default();
    if attachments.is_empty() {
        return message.to_string();
    }

    let mut parts: Vec<String> = attachments
        .iter()
        .enumerate()
        .map(|(i, file)| {
            format!(
                "[Attached file {}: {}]\n\n{}",
                i + 1,
                file.name.as_deref().unwrap_or("file"),
                file.content.as_deref().unwrap_or_default()
            )
        })
        .collect();

    let instruction = if !message.is_empty() {
        message
    } else if attachments.len() > 1 {
        MULTIPLE_ATTACHMENTS_PROMPT
    } else {
        SINGLE_ATTACHMENT_PROMPT
    };
    parts.push(instruction.to_string());

    parts.join(ATTACHMENT_SEPARATOR)
}

/// Who is chatting, for the usage report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub username: String,
    pub is_guest: bool,
}

impl ChatUser {
    /// A missing or blank username, a literal "guest", or `is_guest = true` all
    /// yield the guest user
    pub fn resolve(username: Option<&str>, is_guest: Option<bool>) -> Self {
        let name = username.map(str::trim).unwrap_or_default();
        let guest =
            is_guest.unwrap_or(false) || name.is_empty() || name.eq_ignore_ascii_case(GUEST_USERNAME);

        if guest {
            Self {
                username: GUEST_USERNAME.to_string(),
                is_guest: true,
            }
        } else {
            Self {
                username: name.to_string(),
                is_guest: false,
            }
        }
    }
}

/// What `GET /api/openai/info` reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ServiceInfo {
    Configured {
        model: String,
        credentials_valid: bool,
        credentials_info: CredentialsInfo,
    },
    NotConfigured {
        status: String,
        error: String,
        credentials_info: CredentialsInfo,
    },
}

impl ServiceInfo {
    pub fn configured(model: impl Into<String>, credentials_info: CredentialsInfo) -> Self {
        Self::Configured {
            model: model.into(),
            credentials_valid: true,
            credentials_info,
        }
    }

    pub fn not_configured(error: impl Into<String>, credentials_info: CredentialsInfo) -> Self {
        Self::NotConfigured {
            status: "not_configured".to_string(),
            error: error.into(),
            credentials_info,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            ServiceInfo::Configured { model, .. } => Some(model),
            ServiceInfo::NotConfigured { .. } => None,
        }
    }
}

pub struct ChatGateway {
    client: Option<Arc<dyn CompletionClient>>,
    accountant: Arc<UsageAccountant>,
    reporter: Option<UsageReporter>,
}

impl ChatGateway {
    pub fn new(
        client: Option<Arc<dyn CompletionClient>>,
        accountant: Arc<UsageAccountant>,
        reporter: Option<UsageReporter>,
    ) -> Self {
        Self {
            client,
            accountant,
            reporter,
        }
    }

    pub fn client(&self) -> Option<&Arc<dyn CompletionClient>> {
        self.client.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn accountant(&self) -> &Arc<UsageAccountant> {
        &self.accountant
    }

    /// Handles one chat request. `header_session_id` is used when the body has none.
    pub async fn chat(
        &self,
        request: ChatRequest,
        header_session_id: Option<String>,
    ) -> Result<ChatResponse> {
        let attachments = request.attachments();
        let message = request.message.as_deref().filter(|m| !m.is_empty());

        if message.is_none() && attachments.is_empty() {
            return Err(GatewayError::bad_request("Message or attachment is required"));
        }

        let prompt = merge_attachments(message, &attachments);

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| GatewayError::configuration(NOT_CONFIGURED_MESSAGE))?;

        let user = ChatUser::resolve(request.username.as_deref(), request.is_guest);
        let session_id = request
            .session_id
            .filter(|id| !id.is_empty())
            .or(header_session_id.filter(|id| !id.is_empty()));
        let model = request
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| client.default_model().to_string());

        tracing::info!(
            username = %user.username,
            is_guest = user.is_guest,
            session_id = ?session_id,
            model = %model,
            attachments = attachments.len(),
            "Forwarding chat request"
        );

        let completion = CompletionRequest::new(prompt)
            .with_history(request.history.unwrap_or_default())
            .with_model(Some(model));

        let result = client.complete(completion).await.map_err(|e| {
            tracing::warn!(error = %e, "Chat completion failed");
            GatewayError::from(e)
        })?;

        self.accountant.record(&result.usage);
        log_audit(
            "chat_completion",
            Some(&user.username),
            session_id.as_deref(),
            "complete",
        );

        if let Some(reporter) = &self.reporter {
            reporter.report_in_background(UsageReport::new(
                user.username,
                user.is_guest,
                session_id,
                &result.usage,
            ));
        }

        Ok(ChatResponse {
            message: result.message,
            usage: result.usage,
            timestamp: Local::now(),
        })
    }
}
