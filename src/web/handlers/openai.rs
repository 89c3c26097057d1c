use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::UsageStats;
use crate::services::usage::estimate_cost;
use crate::services::ServiceInfo;
use crate::web::state::AppState;

pub const USAGE_DASHBOARD_URL: &str = "https://platform.openai.com/account/usage";
pub const BILLING_DASHBOARD_URL: &str = "https://platform.openai.com/account/billing";
const USAGE_NOTE: &str =
    "For full account usage and billing credit balance, visit the OpenAI Billing Dashboard";

/// Runs the canary prompt. A failed probe is still a 200 with `status: "error"`;
/// only a missing client answers 500.
pub async fn test_connection(State(state): State<AppState>) -> Response {
    match state.client() {
        Some(client) => Json(client.test_connection().await).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "OpenAI service not configured",
                "info": state.service_info.as_ref(),
            })),
        )
            .into_response(),
    }
}

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.service_info.as_ref().clone())
}

#[derive(Debug, Serialize)]
pub struct UsageSummary {
    #[serde(flatten)]
    pub stats: UsageStats,
    pub estimated_cost_usd: f64,
    pub prompt_cost_usd: f64,
    pub completion_cost_usd: f64,
    pub account_info: Value,
    pub billing_credit_balance: Option<f64>,
    pub usage_dashboard_url: &'static str,
    pub billing_dashboard_url: &'static str,
    pub note: &'static str,
}

pub async fn usage_stats(State(state): State<AppState>) -> Json<UsageSummary> {
    let stats = state.accountant().snapshot();
    let cost = estimate_cost(
        &stats.model,
        stats.total_prompt_tokens,
        stats.total_completion_tokens,
    )
    .rounded();

    // billing balance is not exposed by the provider API
    let account_info = state
        .client()
        .and_then(|client| serde_json::to_value(client.account_info()).ok())
        .unwrap_or_else(|| json!({}));

    Json(UsageSummary {
        stats,
        estimated_cost_usd: cost.total_cost,
        prompt_cost_usd: cost.prompt_cost,
        completion_cost_usd: cost.completion_cost,
        account_info,
        billing_credit_balance: None,
        usage_dashboard_url: USAGE_DASHBOARD_URL,
        billing_dashboard_url: BILLING_DASHBOARD_URL,
        note: USAGE_NOTE,
    })
}
