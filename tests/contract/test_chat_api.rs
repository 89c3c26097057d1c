use alchat::models::{ChatResult, CredentialSource, CredentialsInfo, TokenUsage};
use alchat::services::{
    AccountInfo, ChatGateway, CompletionClient, CompletionRequest, OpenAiClient, OpenAiConfig,
    OpenAiError, ServiceInfo, SessionLogWriter, UsageAccountant, UsageReporter,
};
use alchat::web::{create_routes, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

enum Reply {
    Text(&'static str, TokenUsage),
    AuthFailure,
    ServerFailure,
}

/// Records every request and answers with a fixed reply
struct StubClient {
    reply: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubClient {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatResult, OpenAiError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Text(text, usage) => Ok(ChatResult {
                message: text.to_string(),
                usage: usage.clone(),
            }),
            Reply::AuthFailure => Err(OpenAiError::AuthenticationFailed {
                message: "Incorrect API key provided".to_string(),
            }),
            Reply::ServerFailure => Err(OpenAiError::ServerError {
                status: 502,
                message: "bad gateway".to_string(),
            }),
        }
    }

    fn default_model(&self) -> &str {
        "gpt-3.5-turbo"
    }

    fn account_info(&self) -> AccountInfo {
        AccountInfo {
            api_key_prefix: Some("sk-test...".to_string()),
            model: "gpt-3.5-turbo".to_string(),
            status: "active".to_string(),
        }
    }
}

fn credentials_info(set: bool) -> CredentialsInfo {
    CredentialsInfo {
        openai_api_key_set: set,
        openai_api_key_length: if set { 20 } else { 0 },
        openai_api_key_prefix: set.then(|| "sk-test...".to_string()),
        openai_model: "gpt-3.5-turbo".to_string(),
        config_file_path: "/nonexistent/config.toml".to_string(),
        config_file_exists: false,
        credential_service_url: "http://localhost:3000".to_string(),
        credential_source: if set {
            CredentialSource::Local
        } else {
            CredentialSource::None
        },
    }
}

fn usage(prompt: u64, completion: u64, model: &str) -> TokenUsage {
    TokenUsage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: prompt + completion,
        model: model.to_string(),
    }
}

fn configured_app(client: Arc<dyn CompletionClient>, log_dir: &TempDir) -> Router {
    let accountant = Arc::new(UsageAccountant::new("gpt-3.5-turbo"));
    let gateway = ChatGateway::new(Some(client), accountant, None);
    let state = AppState::new(
        gateway,
        SessionLogWriter::new(log_dir.path()),
        ServiceInfo::configured("gpt-3.5-turbo", credentials_info(true)),
    );
    create_routes(state)
}

fn unconfigured_app(log_dir: &TempDir) -> Router {
    let gateway = ChatGateway::new(None, Arc::new(UsageAccountant::new("unknown")), None);
    let state = AppState::new(
        gateway,
        SessionLogWriter::new(log_dir.path()),
        ServiceInfo::not_configured(
            "OPENAI_API_KEY not found in environment variables. Please set it in .env file.",
            credentials_info(false),
        ),
    );
    create_routes(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let dir = TempDir::new().unwrap();
    let configured = configured_app(
        StubClient::new(Reply::Text("hi", usage(1, 1, "gpt-3.5-turbo"))),
        &dir,
    );
    let (status, body) = send(&configured, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["openai_configured"], true);
    assert!(body["timestamp"].is_string());

    let (_, body) = send(&unconfigured_app(&dir), get("/api/health")).await;
    assert_eq!(body["openai_configured"], false);
}

#[tokio::test]
async fn test_chat_without_message_or_attachment_is_rejected() {
    let dir = TempDir::new().unwrap();
    let stub = StubClient::new(Reply::Text("unused", usage(1, 1, "gpt-3.5-turbo")));
    let app = configured_app(stub.clone(), &dir);

    let (status, body) = send(&app, post_json("/api/chat", json!({"message": ""}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message or attachment is required");
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_chat_with_malformed_json_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(
        StubClient::new(Reply::Text("unused", usage(1, 1, "gpt-3.5-turbo"))),
        &dir,
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_success_updates_usage() {
    let dir = TempDir::new().unwrap();
    let stub = StubClient::new(Reply::Text("Hello back", usage(1000, 1000, "gpt-4-turbo")));
    let app = configured_app(stub.clone(), &dir);

    let (status, body) = send(
        &app,
        post_json(
            "/api/chat",
            json!({
                "message": "Hello",
                "history": [{"role": "user", "content": "earlier"}],
                "model": "gpt-4-turbo"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello back");
    assert_eq!(body["usage"]["total_tokens"], 2000);
    assert!(body["timestamp"].is_string());

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "Hello");
    assert_eq!(requests[0].history.len(), 1);
    assert_eq!(requests[0].model.as_deref(), Some("gpt-4-turbo"));

    let (status, usage) = send(&app, get("/api/openai/usage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["request_count"], 1);
    assert_eq!(usage["total_prompt_tokens"], 1000);
    assert_eq!(usage["total_completion_tokens"], 1000);
    assert_eq!(usage["model"], "gpt-4-turbo");
    assert_eq!(usage["estimated_cost_usd"], 0.04);
    assert_eq!(usage["prompt_cost_usd"], 0.01);
    assert_eq!(usage["completion_cost_usd"], 0.03);
    assert_eq!(usage["account_info"]["status"], "active");
    assert!(usage["billing_credit_balance"].is_null());
    assert_eq!(
        usage["usage_dashboard_url"],
        "https://platform.openai.com/account/usage"
    );
}

#[tokio::test]
async fn test_chat_merges_attachments_into_prompt() {
    let dir = TempDir::new().unwrap();
    let stub = StubClient::new(Reply::Text("analysis", usage(5, 5, "gpt-3.5-turbo")));
    let app = configured_app(stub.clone(), &dir);

    let (status, _) = send(
        &app,
        post_json(
            "/api/chat",
            json!({
                "attached_files": [
                    {"name": "a.txt", "content": "alpha"},
                    {"name": "b.txt", "content": "beta"}
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prompt = &stub.requests()[0].message;
    assert_eq!(
        prompt,
        "[Attached file 1: a.txt]\n\nalpha\n\n---\n\n[Attached file 2: b.txt]\n\nbeta\n\n---\n\nPlease compare and analyze the attached files."
    );
}

#[tokio::test]
async fn test_chat_legacy_single_attachment() {
    let dir = TempDir::new().unwrap();
    let stub = StubClient::new(Reply::Text("analysis", usage(5, 5, "gpt-3.5-turbo")));
    let app = configured_app(stub.clone(), &dir);

    let (status, _) = send(
        &app,
        post_json(
            "/api/chat",
            json!({
                "message": "What does this do?",
                "attached_content": "fn main() {}",
                "attached_filename": "main.rs"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stub.requests()[0].message,
        "[Attached file 1: main.rs]\n\nfn main() {}\n\n---\n\nWhat does this do?"
    );
}

#[tokio::test]
async fn test_chat_auth_failure_is_401() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(StubClient::new(Reply::AuthFailure), &dir);

    let (status, body) = send(&app, post_json("/api/chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("check your credentials"));
}

#[tokio::test]
async fn test_chat_provider_failure_is_500() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(StubClient::new(Reply::ServerFailure), &dir);

    let (status, body) = send(&app, post_json("/api/chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("OpenAI API error:"));
    assert!(error.contains("bad gateway"));

    let (_, usage) = send(&app, get("/api/openai/usage")).await;
    assert_eq!(usage["request_count"], 0);
}

#[tokio::test]
async fn test_degraded_mode_endpoints() {
    let dir = TempDir::new().unwrap();
    let app = unconfigured_app(&dir);

    let (status, body) = send(&app, post_json("/api/chat", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "OpenAI service not configured. Please set OPENAI_API_KEY in .env file."
    );

    let (status, body) = send(&app, get("/api/openai/test")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["info"]["status"], "not_configured");

    let (status, body) = send(&app, get("/api/openai/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_configured");
    assert_eq!(body["credentials_info"]["openai_api_key_set"], false);

    let (_, usage) = send(&app, get("/api/openai/usage")).await;
    assert_eq!(usage["model"], "unknown");
    assert_eq!(usage["account_info"], json!({}));
}

#[tokio::test]
async fn test_openai_info_when_configured() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(
        StubClient::new(Reply::Text("hi", usage(1, 1, "gpt-3.5-turbo"))),
        &dir,
    );

    let (status, body) = send(&app, get("/api/openai/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["credentials_valid"], true);
    assert_eq!(body["credentials_info"]["openai_api_key_prefix"], "sk-test...");
}

#[tokio::test]
async fn test_openai_probe_when_configured() {
    let dir = TempDir::new().unwrap();
    let app = configured_app(
        StubClient::new(Reply::Text(
            "Connection successful",
            usage(10, 3, "gpt-3.5-turbo"),
        )),
        &dir,
    );

    let (status, body) = send(&app, get("/api/openai/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["test_response"], "Connection successful");
}

async fn wait_for_requests(server: &MockServer, expected: usize) -> Vec<wiremock::Request> {
    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= expected {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

#[tokio::test]
async fn test_chat_end_to_end_reports_usage() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}],
            "usage": {"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}
        })))
        .mount(&provider)
        .await;

    let accounting = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/usage/log"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&accounting)
        .await;

    let client = OpenAiClient::new(
        OpenAiConfig::new("sk-test-key-123".to_string())
            .with_base_url(format!("{}/v1", provider.uri())),
    )
    .unwrap();
    let client: Arc<dyn CompletionClient> = Arc::new(client);
    let accountant = Arc::new(UsageAccountant::new("gpt-3.5-turbo"));
    let gateway = ChatGateway::new(
        Some(client),
        accountant,
        Some(UsageReporter::new(accounting.uri())),
    );
    let dir = TempDir::new().unwrap();
    let app = create_routes(AppState::new(
        gateway,
        SessionLogWriter::new(dir.path()),
        ServiceInfo::configured("gpt-3.5-turbo", credentials_info(true)),
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .header("x-session-id", "session_20240101_090000")
        .body(Body::from(
            json!({"message": "ping", "username": "ana"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "pong");
    assert_eq!(body["usage"]["total_tokens"], 9);

    let reports = wait_for_requests(&accounting, 1).await;
    assert_eq!(reports.len(), 1);
    let report: Value = serde_json::from_slice(&reports[0].body).unwrap();
    assert_eq!(report["username"], "ana");
    assert_eq!(report["is_guest"], false);
    assert_eq!(report["session_id"], "session_20240101_090000");
    assert_eq!(report["provider"], "openai");
    assert_eq!(report["total_tokens"], 9);
}

#[tokio::test]
async fn test_failed_usage_report_does_not_affect_response() {
    let accounting = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/usage/log"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&accounting)
        .await;

    let stub: Arc<dyn CompletionClient> =
        StubClient::new(Reply::Text("fine", usage(3, 4, "gpt-3.5-turbo")));
    let gateway = ChatGateway::new(
        Some(stub),
        Arc::new(UsageAccountant::new("gpt-3.5-turbo")),
        Some(UsageReporter::new(accounting.uri())),
    );
    let dir = TempDir::new().unwrap();
    let app = create_routes(AppState::new(
        gateway,
        SessionLogWriter::new(dir.path()),
        ServiceInfo::configured("gpt-3.5-turbo", credentials_info(true)),
    ));

    let (status, body) = send(
        &app,
        post_json("/api/chat", json!({"message": "hi", "username": "guest"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "fine");

    let reports = wait_for_requests(&accounting, 1).await;
    let report: Value = serde_json::from_slice(&reports[0].body).unwrap();
    assert_eq!(report["username"], "guest");
    assert_eq!(report["is_guest"], true);
}
