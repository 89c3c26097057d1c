//! Shared application state and its construction at startup

use std::sync::Arc;

use crate::config::Settings;
use crate::error::GatewayError;
use crate::services::{
    ChatGateway, CompletionClient, CredentialResolver, OpenAiClient, ServiceInfo,
    SessionLogWriter, SessionRegistry, UsageAccountant, UsageReporter,
};

/// Model recorded in the usage counters when no client could be built
pub const UNKNOWN_MODEL: &str = "unknown";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ChatGateway>,
    pub session_log: Arc<SessionLogWriter>,
    pub sessions: Arc<SessionRegistry>,
    pub service_info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(
        gateway: ChatGateway,
        session_log: SessionLogWriter,
        service_info: ServiceInfo,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            session_log: Arc::new(session_log),
            sessions: Arc::new(SessionRegistry::new()),
            service_info: Arc::new(service_info),
        }
    }

    /// Resolves credentials and builds the provider client.
    ///
    /// Never fails: without a usable key the state is built in degraded mode,
    /// chat requests answer 500 and `/api/openai/info` says why.
    pub async fn initialize(settings: Settings) -> Self {
        let resolver = CredentialResolver::new(settings.clone());
        let credentials = resolver.resolve().await;
        let credentials_info = resolver.credentials_info(&credentials);

        let (client, service_info) = match OpenAiClient::from_credentials(&credentials, &settings)
        {
            Ok(client) => {
                tracing::info!(
                    model = %credentials.model,
                    source = %credentials.source,
                    "OpenAI service initialized"
                );
                let client: Arc<dyn CompletionClient> = Arc::new(client);
                (
                    Some(client),
                    ServiceInfo::configured(credentials.model.clone(), credentials_info),
                )
            }
            Err(e) => {
                let error = GatewayError::from(e);
                tracing::warn!(
                    error = %error,
                    "OpenAI features will not be available"
                );
                (
                    None,
                    ServiceInfo::not_configured(error.to_string(), credentials_info),
                )
            }
        };

        let accountant = Arc::new(UsageAccountant::new(
            service_info.model().unwrap_or(UNKNOWN_MODEL),
        ));
        let reporter = UsageReporter::new(settings.credential_service_url.clone());
        let gateway = ChatGateway::new(client, accountant, Some(reporter));

        Self::new(
            gateway,
            SessionLogWriter::new(settings.session_log_dir),
            service_info,
        )
    }

    pub fn accountant(&self) -> &Arc<UsageAccountant> {
        self.gateway.accountant()
    }

    pub fn client(&self) -> Option<&Arc<dyn CompletionClient>> {
        self.gateway.client()
    }
}
