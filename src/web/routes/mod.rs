use axum::{
    routing::{get, post},
    Router,
};

use crate::web::handlers;
use crate::web::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openai/test", get(handlers::test_connection))
        .route("/openai/info", get(handlers::service_info))
        .route("/openai/usage", get(handlers::usage_stats))
        .route("/chat", post(handlers::chat))
        .route("/session/start", post(handlers::start_session))
        .route("/session/stop", post(handlers::stop_session));

    Router::new().nest("/api", api_routes).with_state(state)
}
