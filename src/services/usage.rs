//! Process-lifetime token accounting and the best-effort external usage report

use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::{GatewayError, Result};
use crate::models::{CostEstimate, TokenUsage, UsageStats};

pub const USAGE_LOG_PATH: &str = "/api/usage/log";
pub const USAGE_REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// USD per 1000 tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt: f64,
    pub completion: f64,
}

const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    ("gpt-4", ModelPricing { prompt: 0.03, completion: 0.06 }),
    ("gpt-4-turbo", ModelPricing { prompt: 0.01, completion: 0.03 }),
    ("gpt-3.5-turbo", DEFAULT_PRICING),
    ("gpt-3.5-turbo-16k", ModelPricing { prompt: 0.003, completion: 0.004 }),
];

const DEFAULT_PRICING_KEY: &str = "gpt-3.5-turbo";
const DEFAULT_PRICING: ModelPricing = ModelPricing {
    prompt: 0.0015,
    completion: 0.002,
};

/// Maps a model name onto a price-table key by substring checks
pub fn pricing_key(model: &str) -> &'static str {
    if model.contains("gpt-4") && model.contains("turbo") {
        "gpt-4-turbo"
    } else if model.contains("gpt-3.5") && model.contains("16k") {
        "gpt-3.5-turbo-16k"
    } else if model.contains("gpt-3.5") {
        "gpt-3.5-turbo"
    } else if model.contains("gpt-4") {
        "gpt-4"
    } else {
        DEFAULT_PRICING_KEY
    }
}

fn lookup(key: &str) -> Option<ModelPricing> {
    PRICE_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, pricing)| *pricing)
}

pub fn pricing_for(model: &str) -> ModelPricing {
    lookup(pricing_key(model))
        .or_else(|| lookup(DEFAULT_PRICING_KEY))
        .unwrap_or(DEFAULT_PRICING)
}

pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> CostEstimate {
    let pricing = pricing_for(model);
    let prompt_cost = prompt_tokens as f64 / 1000.0 * pricing.prompt;
    let completion_cost = completion_tokens as f64 / 1000.0 * pricing.completion;

    CostEstimate {
        prompt_cost,
        completion_cost,
        total_cost: prompt_cost + completion_cost,
    }
}

/// Cumulative counters shared by all request handlers. Advisory only, lost on restart.
#[derive(Debug)]
pub struct UsageAccountant {
    stats: Mutex<UsageStats>,
}

impl UsageAccountant {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            stats: Mutex::new(UsageStats::new(model)),
        }
    }

    pub fn record(&self, usage: &TokenUsage) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.add(usage);
        tracing::debug!(
            request_count = stats.request_count,
            total_tokens = stats.total_tokens,
            "Recorded token usage"
        );
    }

    pub fn snapshot(&self) -> UsageStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn estimate_cost(&self) -> CostEstimate {
        let stats = self.snapshot();
        estimate_cost(
            &stats.model,
            stats.total_prompt_tokens,
            stats.total_completion_tokens,
        )
    }
}

/// Body posted to the accounting service after each successful chat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageReport {
    pub username: String,
    pub is_guest: bool,
    pub session_id: Option<String>,
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub timestamp: DateTime<Local>,
}

impl UsageReport {
    pub fn new(
        username: impl Into<String>,
        is_guest: bool,
        session_id: Option<String>,
        usage: &TokenUsage,
    ) -> Self {
        Self {
            username: username.into(),
            is_guest,
            session_id,
            provider: "openai".to_string(),
            model: usage.model.clone(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            timestamp: Local::now(),
        }
    }
}

/// Client for `POST {base_url}/api/usage/log`
#[derive(Clone)]
pub struct UsageReporter {
    base_url: String,
    client: Client,
}

impl UsageReporter {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(USAGE_REPORT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Any failure, including a non-200 answer, comes back as `BestEffort`
    pub async fn report(&self, report: &UsageReport) -> Result<()> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), USAGE_LOG_PATH);

        let response = self
            .client
            .post(&url)
            .json(report)
            .send()
            .await
            .map_err(|e| GatewayError::best_effort(format!("Usage log request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GatewayError::best_effort(format!(
                "Usage log returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    /// Sends the report on a background task; errors are logged and dropped
    pub fn report_in_background(&self, report: UsageReport) {
        let reporter = self.clone();
        tokio::spawn(async move {
            if let Err(e) = reporter.report(&report).await {
                tracing::warn!(
                    error = %e,
                    username = %report.username,
                    "Failed to report usage to accounting service"
                );
            }
        });
    }
}
