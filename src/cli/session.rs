use anyhow::{Context, Result};
use console::style;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::models::SessionLogEntry;
use crate::services::SessionLogWriter;

/// Appends a `session_stop` record. No start time is known here, so the
/// duration is always null.
pub async fn handle_save_command(
    metrics_file: Option<PathBuf>,
    session_id: Option<String>,
) -> Result<()> {
    let metrics = metrics_file
        .map(|path| read_metrics(&path))
        .transpose()?;

    let settings = Settings::load()?;
    let writer = SessionLogWriter::new(settings.session_log_dir);
    let entry = writer.stop_session(None, session_id, metrics)?;

    println!("{} Session saved", style("✓").green());
    println!(
        "  {} {}",
        style("session:").dim(),
        entry.session_id().unwrap_or("manual_entry")
    );
    println!("  {} {}", style("timestamp:").dim(), entry.timestamp().to_rfc3339());
    if let SessionLogEntry::SessionStop { metrics, .. } = &entry {
        let categories = metrics.as_object().map(|m| m.len()).unwrap_or(0);
        println!("  {} {}", style("metric categories:").dim(), categories);
    }
    println!(
        "  {} {}",
        style("log file:").dim(),
        writer.log_file_path().display()
    );

    Ok(())
}

pub async fn handle_metric_command(session_id: String, name: String, value: String) -> Result<()> {
    let settings = Settings::load()?;
    let writer = SessionLogWriter::new(settings.session_log_dir);

    writer.log_metric(Some(session_id), &name, parse_metric_value(&value))?;

    println!(
        "{} Metric '{}' recorded",
        style("✓").green(),
        style(&name).cyan()
    );
    Ok(())
}

fn read_metrics(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metrics file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Metrics file {} is not valid JSON", path.display()))
}

/// JSON when it parses, otherwise the raw text as a string
fn parse_metric_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
