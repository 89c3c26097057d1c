use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::env::logging as env_vars;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Diagnostic logging configuration for the gateway
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: Level,
    /// Whether to log to stdout
    pub stdout: bool,
    /// Optional file path for logging
    pub file_path: Option<PathBuf>,
    /// Whether to use JSON format
    pub json_format: bool,
    /// Whether to use ANSI colors
    pub use_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            stdout: true,
            file_path: None,
            json_format: false,
            use_colors: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.stdout = enabled;
        self
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level_str) = env::var(env_vars::LOG_LEVEL) {
            config.level = parse_level(&level_str);
        }

        if let Ok(file_path) = env::var(env_vars::LOG_FILE) {
            if !file_path.trim().is_empty() {
                config.file_path = Some(PathBuf::from(file_path));
            }
        }

        if env::var(env_vars::NO_COLOR).is_ok() {
            config.use_colors = false;
        }

        config
    }

    /// Debug logging to stdout
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Self::default()
        }
    }
}

fn parse_level(value: &str) -> Level {
    match value.trim().to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Initialize logging with the given configuration.
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process when a log file is configured.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = LevelFilter::from_level(config.level);
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.stdout {
        let layer = fmt::layer()
            .with_ansi(config.use_colors)
            .with_level(true)
            .with_target(true);
        let layer = if config.json_format {
            layer.json().with_filter(filter).boxed()
        } else {
            layer.with_filter(filter).boxed()
        };
        layers.push(layer);
    }

    if let Some(path) = &config.file_path {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .context("Log file path has no file name")?;

        std::fs::create_dir_all(&directory).with_context(|| {
            format!("Failed to create log directory: {}", directory.display())
        })?;

        let appender = tracing_appender::rolling::never(&directory, file_name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true);
        let layer = if config.json_format {
            layer.json().with_filter(filter).boxed()
        } else {
            layer.with_filter(filter).boxed()
        };
        layers.push(layer);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        level = ?config.level,
        stdout = config.stdout,
        file_path = ?config.file_path,
        json_format = config.json_format,
        "Logging initialized"
    );

    Ok(guard)
}

/// Initialize logging from environment variables
pub fn init_from_env() -> Result<Option<WorkerGuard>> {
    init_logging(LoggingConfig::from_env())
}

/// Log error with context
pub fn log_error<E: std::fmt::Display>(error: &E, context: &str) {
    tracing::error!(error = %error, context = context, "Error occurred");
}

/// Log audit events
pub fn log_audit(event: &str, user: Option<&str>, resource: Option<&str>, action: &str) {
    tracing::info!(
        event = event,
        user = user,
        resource = resource,
        action = action,
        audit = true,
        "Audit event"
    );
}
