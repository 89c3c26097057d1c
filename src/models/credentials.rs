use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Prefix every OpenAI secret key starts with
pub const OPENAI_KEY_PREFIX: &str = "sk-";

/// Where the API key came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Remote,
    Local,
    #[default]
    None,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Remote => write!(f, "remote"),
            CredentialSource::Local => write!(f, "local"),
            CredentialSource::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub model: String,
    pub source: CredentialSource,
}

impl Credentials {
    pub fn new(api_key: Option<String>, model: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            api_key,
            model: model.into(),
            source,
        }
    }

    /// Checks the key is present and carries the provider prefix
    pub fn validate(&self) -> Result<(), GatewayError> {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(GatewayError::configuration(
                "OPENAI_API_KEY not found in environment variables. Please set it in .env file.",
            ));
        };

        if !api_key.starts_with(OPENAI_KEY_PREFIX) {
            return Err(GatewayError::configuration(format!(
                "OPENAI_API_KEY appears to be invalid. OpenAI API keys start with '{OPENAI_KEY_PREFIX}'."
            )));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// First 7 characters followed by "..." when the key is longer than that
    pub fn key_prefix(&self) -> Option<String> {
        let key = self.api_key.as_deref()?;
        if key.chars().count() > 7 {
            Some(format!("{}...", key.chars().take(7).collect::<String>()))
        } else {
            None
        }
    }
}

/// Credential diagnostics that never expose the key itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsInfo {
    pub openai_api_key_set: bool,
    pub openai_api_key_length: usize,
    pub openai_api_key_prefix: Option<String>,
    pub openai_model: String,
    pub config_file_path: String,
    pub config_file_exists: bool,
    pub credential_service_url: String,
    pub credential_source: CredentialSource,
}
