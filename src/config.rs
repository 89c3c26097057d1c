//! Configuration file management for alchat
//!
//! Values live in ~/.alchat/config.toml and can be overridden by environment
//! variables (see [`crate::env`]). [`Settings`] is the resolved view the rest of
//! the application reads from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env::{credential_service as env_remote, openai as env_openai, session_log as env_log};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CREDENTIAL_SERVICE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_LOG_DIR: &str = "SessionLog";
pub const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 30;

/// Configuration structure matching config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub credential_service: CredentialServiceSection,
    #[serde(default)]
    pub session_log: SessionLogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OpenAiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CredentialServiceSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionLogSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Config {
    /// Get the config file path (~/.alchat/config.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Could not find home directory")?;
        Ok(home_dir.join(".alchat").join("config.toml"))
    }

    /// Load configuration from the default location.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        // Owner read/write only, the file may hold an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(config_path, permissions).with_context(|| {
                format!(
                    "Failed to set permissions on config file: {}",
                    config_path.display()
                )
            })?;
        }

        Ok(())
    }

    /// Get a config value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match normalize_key(key).as_str() {
            "openai-api-key" => self.openai.api_key.clone(),
            "openai-model" => self.openai.model.clone(),
            "openai-base-url" => self.openai.base_url.clone(),
            "credential-service-url" => self.credential_service.url.clone(),
            "session-log-dir" => self.session_log.dir.clone(),
            _ => None,
        }
    }

    /// Set a config value by key
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        *self.slot_mut(key)? = Some(value);
        Ok(())
    }

    /// Unset (remove) a config value by key
    pub fn unset(&mut self, key: &str) -> Result<()> {
        *self.slot_mut(key)? = None;
        Ok(())
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut Option<String>> {
        let slot = match normalize_key(key).as_str() {
            "openai-api-key" => &mut self.openai.api_key,
            "openai-model" => &mut self.openai.model,
            "openai-base-url" => &mut self.openai.base_url,
            "credential-service-url" => &mut self.credential_service.url,
            "session-log-dir" => &mut self.session_log.dir,
            _ => anyhow::bail!("Unknown config key: {}", key),
        };
        Ok(slot)
    }

    /// Get all config values as key-value pairs, API keys masked
    pub fn list(&self) -> Vec<(String, String)> {
        let mut items = Vec::new();

        if let Some(ref key) = self.openai.api_key {
            items.push(("openai-api-key".to_string(), mask_api_key(key)));
        }
        if let Some(ref model) = self.openai.model {
            items.push(("openai-model".to_string(), model.clone()));
        }
        if let Some(ref url) = self.openai.base_url {
            items.push(("openai-base-url".to_string(), url.clone()));
        }
        if let Some(ref url) = self.credential_service.url {
            items.push(("credential-service-url".to_string(), url.clone()));
        }
        if let Some(ref dir) = self.session_log.dir {
            items.push(("session-log-dir".to_string(), dir.clone()));
        }

        items
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

/// Mask API key for display (show first 4 and last 4 characters)
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Resolved runtime settings: environment variable > config file > default
#[derive(Debug, Clone)]
pub struct Settings {
    /// Locally configured API key, used when the credential service has none
    pub local_api_key: Option<String>,
    pub model: String,
    pub openai_base_url: String,
    pub openai_timeout: Duration,
    pub credential_service_url: String,
    pub session_log_dir: PathBuf,
    pub config_file_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            local_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_timeout: Duration::from_secs(DEFAULT_OPENAI_TIMEOUT_SECS),
            credential_service_url: DEFAULT_CREDENTIAL_SERVICE_URL.to_string(),
            session_log_dir: PathBuf::from(DEFAULT_SESSION_LOG_DIR),
            config_file_path: PathBuf::from("config.toml"),
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment and the default config file
    pub fn load() -> Result<Self> {
        let config_path = Config::get_config_path()?;
        let config = Config::load_from(&config_path)?;
        Ok(Self::resolve(&config, config_path))
    }

    pub fn resolve(config: &Config, config_file_path: PathBuf) -> Self {
        let timeout_secs = env_value(env_openai::TIMEOUT_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_OPENAI_TIMEOUT_SECS);

        Self {
            local_api_key: env_value(env_openai::API_KEY)
                .or_else(|| non_empty(config.openai.api_key.as_deref())),
            model: env_value(env_openai::MODEL)
                .or_else(|| non_empty(config.openai.model.as_deref()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: env_value(env_openai::BASE_URL)
                .or_else(|| non_empty(config.openai.base_url.as_deref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_timeout: Duration::from_secs(timeout_secs),
            credential_service_url: env_value(env_remote::URL)
                .or_else(|| non_empty(config.credential_service.url.as_deref()))
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_SERVICE_URL.to_string()),
            session_log_dir: env_value(env_log::DIR)
                .or_else(|| non_empty(config.session_log.dir.as_deref()))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_LOG_DIR)),
            config_file_path,
        }
    }

    pub fn config_file_exists(&self) -> bool {
        self.config_file_path.exists()
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(&v)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
