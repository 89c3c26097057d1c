use serde::{Deserialize, Serialize};

/// Token counts reported by the provider for one request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub model: String,
}

/// Cumulative usage since process start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageStats {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    pub request_count: u64,
    pub model: String,
}

impl UsageStats {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            total_prompt_tokens: 0,
            total_completion_tokens: 0,
            total_tokens: 0,
            request_count: 0,
            model: model.into(),
        }
    }

    pub fn add(&mut self, usage: &TokenUsage) {
        self.total_prompt_tokens = self.total_prompt_tokens.saturating_add(usage.prompt_tokens);
        self.total_completion_tokens = self
            .total_completion_tokens
            .saturating_add(usage.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(usage.total_tokens);
        self.request_count = self.request_count.saturating_add(1);
        if !usage.model.is_empty() {
            self.model = usage.model.clone();
        }
    }
}

/// Estimated spend in USD
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    pub prompt_cost: f64,
    pub completion_cost: f64,
    pub total_cost: f64,
}

impl CostEstimate {
    /// Each field rounded to 4 decimals for display
    pub fn rounded(&self) -> Self {
        Self {
            prompt_cost: round4(self.prompt_cost),
            completion_cost: round4(self.completion_cost),
            total_cost: round4(self.total_cost),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
