use async_trait::async_trait;
use reqwest::{Client, Response};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::OpenAiError;
use super::models::{ChatCompletionRequest, ChatCompletionResponse};
use crate::config::{Settings, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_TIMEOUT_SECS};
use crate::models::{ChatResult, ConversationMessage, Credentials};
use crate::services::completion::{AccountInfo, CompletionClient, CompletionRequest};

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_OPENAI_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.key_prefix())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// Builds a config from resolved credentials, rejecting keys that fail validation
    pub fn from_credentials(
        credentials: &Credentials,
        settings: &Settings,
    ) -> Result<Self, OpenAiError> {
        credentials
            .validate()
            .map_err(|e| OpenAiError::ConfigurationError {
                message: e.to_string(),
            })?;

        Ok(Self {
            api_key: credentials.api_key.clone().unwrap_or_default(),
            base_url: settings.openai_base_url.clone(),
            model: credentials.model.clone(),
            timeout: settings.openai_timeout,
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), OpenAiError> {
        if self.api_key.is_empty() {
            return Err(OpenAiError::ConfigurationError {
                message: "OpenAI API key is required".to_string(),
            });
        }

        if self.base_url.is_empty() {
            return Err(OpenAiError::ConfigurationError {
                message: "Base URL cannot be empty".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(OpenAiError::ConfigurationError {
                message: "Model name cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// First 7 characters of the key followed by `...`; `None` for short keys
    fn key_prefix(&self) -> Option<String> {
        let key = &self.api_key;
        (key.chars().count() > 7).then(|| format!("{}...", key.chars().take(7).collect::<String>()))
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OpenAiError::ConfigurationError {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    pub fn from_credentials(
        credentials: &Credentials,
        settings: &Settings,
    ) -> Result<Self, OpenAiError> {
        Self::new(OpenAiConfig::from_credentials(credentials, settings)?)
    }

    /// Send `message` after a copy of `history`; the caller's slice is left untouched
    pub async fn send_message(
        &self,
        message: &str,
        history: &[ConversationMessage],
        model: Option<&str>,
    ) -> Result<ChatResult, OpenAiError> {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.config.model);
        let request = ChatCompletionRequest::new(model, history.to_vec(), message);
        let response = self.create_chat_completion(&request).await?;

        let text = response
            .extract_text()
            .ok_or_else(|| OpenAiError::InvalidResponse {
                message: "No choices in completion response".to_string(),
            })?;

        Ok(ChatResult {
            message: text,
            usage: response.token_usage(model),
        })
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = timeout(
            self.config.timeout,
            self.client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(request)
                .send(),
        )
        .await
        .map_err(|_| OpenAiError::Timeout {
            timeout_ms: self.config.timeout_ms(),
        })?
        .map_err(|e| OpenAiError::from_reqwest_error(e, self.config.timeout_ms()))?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: Response,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        let status = response.status();

        if status.is_success() {
            let response_text = response
                .text()
                .await
                .map_err(|e| OpenAiError::from_reqwest_error(e, self.config.timeout_ms()))?;

            serde_json::from_str(&response_text).map_err(|e| OpenAiError::ParseError {
                message: format!("Failed to parse response: {e}"),
            })
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            tracing::warn!(status = status.as_u16(), "OpenAI request failed");
            Err(OpenAiError::from_status_and_body(status, &error_body))
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResult, OpenAiError> {
        self.send_message(&request.message, &request.history, request.model.as_deref())
            .await
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    fn account_info(&self) -> AccountInfo {
        AccountInfo {
            api_key_prefix: self.config.key_prefix(),
            model: self.config.model.clone(),
            status: "active".to_string(),
        }
    }
}
