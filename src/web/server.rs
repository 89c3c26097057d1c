use anyhow::Result;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::logging::log_error;
use crate::web::routes;
use crate::web::state::AppState;

/// Description of this service written as the day's `project_init` record
pub fn project_criteria() -> Value {
    json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "backend": "Rust",
        "provider": "openai",
        "session_log_rules": {
            "log_timestamp_start_stop": true,
            "append_mode": true,
            "add_metrics_to_session": true,
            "new_log_per_day": true,
        },
    })
}

pub async fn run_server(host: &str, port: u16, state: AppState) -> Result<()> {
    if let Err(e) = state.session_log.log_project_init(project_criteria()) {
        log_error(&e, "writing project_init entry");
    }

    let openai_configured = state.gateway.is_configured();

    let app = routes::create_routes(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, openai_configured, "Gateway listening");
    println!("alchat gateway running at http://{addr}");
    println!("Health check: http://{addr}/api/health");
    if !openai_configured {
        println!("OpenAI is not configured; chat requests will fail until a key is set");
    }
    println!();
    println!("Press Ctrl+C to stop the server");

    axum::serve(listener, app).await?;

    Ok(())
}
