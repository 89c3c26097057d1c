//! API key resolution: remote credential service first, local settings second

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::Settings;
use crate::models::{CredentialSource, Credentials, CredentialsInfo};

pub const CREDENTIALS_PATH: &str = "/api/credentials/global/openai";
pub const REMOTE_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Field paths tried in order when reading a key from the credential service
const KEY_PATHS: &[&[&str]] = &[
    &["credentials", "credentials", "api_key"],
    &["credentials", "api_key"],
    &["api_key"],
    &["value"],
    &["credential_value"],
];

#[derive(Clone)]
pub struct CredentialResolver {
    settings: Settings,
    client: Client,
}

impl CredentialResolver {
    pub fn new(settings: Settings) -> Self {
        let client = Client::builder()
            .timeout(REMOTE_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for credential service");
                Client::new()
            });

        Self { settings, client }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Never fails: an unreachable credential service falls through to local settings
    pub async fn resolve(&self) -> Credentials {
        let model = self.settings.model.clone();

        if let Some(api_key) = self.fetch_remote_key().await {
            tracing::info!(source = "remote", "Resolved OpenAI credentials");
            return Credentials::new(Some(api_key), model, CredentialSource::Remote);
        }

        if let Some(api_key) = self
            .settings
            .local_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            tracing::info!(source = "local", "Resolved OpenAI credentials");
            return Credentials::new(Some(api_key.to_string()), model, CredentialSource::Local);
        }

        tracing::warn!("No OpenAI credentials found in credential service or local settings");
        Credentials::new(None, model, CredentialSource::None)
    }

    pub async fn fetch_remote_key(&self) -> Option<String> {
        match self.try_fetch_remote_key().await {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    url = %self.settings.credential_service_url,
                    "Credential service unavailable"
                );
                None
            }
        }
    }

    async fn try_fetch_remote_key(&self) -> Result<Option<String>, reqwest::Error> {
        let url = format!(
            "{}{}",
            self.settings.credential_service_url.trim_end_matches('/'),
            CREDENTIALS_PATH
        );

        let response = self.client.get(&url).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = response.status().as_u16(), "Credential service returned no key");
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(extract_api_key(&body))
    }

    /// Diagnostics for the info endpoint and the `credentials` command
    pub fn credentials_info(&self, credentials: &Credentials) -> CredentialsInfo {
        CredentialsInfo {
            openai_api_key_set: credentials.api_key.is_some(),
            openai_api_key_length: credentials
                .api_key
                .as_deref()
                .map(|k| k.chars().count())
                .unwrap_or(0),
            openai_api_key_prefix: credentials.key_prefix(),
            openai_model: credentials.model.clone(),
            config_file_path: self.settings.config_file_path.display().to_string(),
            config_file_exists: self.settings.config_file_exists(),
            credential_service_url: self.settings.credential_service_url.clone(),
            credential_source: credentials.source,
        }
    }
}

/// First non-empty trimmed string found along [`KEY_PATHS`]
pub fn extract_api_key(body: &Value) -> Option<String> {
    if !body.is_object() {
        return None;
    }

    KEY_PATHS.iter().find_map(|path| {
        path.iter()
            .try_fold(body, |node, field| node.get(field))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    })
}
