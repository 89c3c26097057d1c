use anyhow::Result;

use crate::config::Settings;
use crate::web::{run_server, AppState};

pub async fn handle_serve_command(host: String, port: u16) -> Result<()> {
    let settings = Settings::load()?;
    tracing::debug!(
        credential_service = %settings.credential_service_url,
        session_log_dir = %settings.session_log_dir.display(),
        "Loaded settings"
    );

    let state = AppState::initialize(settings).await;
    run_server(&host, port, state).await
}
