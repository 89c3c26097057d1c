use alchat::config::Settings;
use alchat::models::CredentialSource;
use alchat::services::{CredentialResolver, OpenAiClient};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CREDENTIALS_PATH: &str = "/api/credentials/global/openai";

/// Address of a port nothing listens on
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn settings(service_url: &str, local_key: Option<&str>) -> Settings {
    Settings {
        local_api_key: local_key.map(str::to_string),
        model: "gpt-4".to_string(),
        credential_service_url: service_url.to_string(),
        config_file_path: PathBuf::from("/nonexistent/alchat/config.toml"),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_remote_key_wins_over_local_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CREDENTIALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": {"credentials": {"api_key": "sk-remote-000111"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = CredentialResolver::new(settings(&server.uri(), Some("sk-local-999888")));
    let credentials = resolver.resolve().await;

    assert_eq!(credentials.api_key.as_deref(), Some("sk-remote-000111"));
    assert_eq!(credentials.source, CredentialSource::Remote);
    assert_eq!(credentials.model, "gpt-4");
    assert!(credentials.is_valid());
}

#[tokio::test]
async fn test_flat_remote_shapes_are_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CREDENTIALS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"credential_value": "  sk-flat-1234  "})),
        )
        .mount(&server)
        .await;

    let credentials = CredentialResolver::new(settings(&server.uri(), None))
        .resolve()
        .await;
    assert_eq!(credentials.api_key.as_deref(), Some("sk-flat-1234"));
    assert_eq!(credentials.source, CredentialSource::Remote);
}

#[tokio::test]
async fn test_non_200_falls_back_to_local() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CREDENTIALS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"api_key": "sk-ignored"})))
        .mount(&server)
        .await;

    let credentials = CredentialResolver::new(settings(&server.uri(), Some("sk-local-999888")))
        .resolve()
        .await;
    assert_eq!(credentials.api_key.as_deref(), Some("sk-local-999888"));
    assert_eq!(credentials.source, CredentialSource::Local);
}

#[tokio::test]
async fn test_blank_remote_key_falls_back_to_local() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CREDENTIALS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"api_key": "   "})))
        .mount(&server)
        .await;

    let credentials = CredentialResolver::new(settings(&server.uri(), Some("sk-local-999888")))
        .resolve()
        .await;
    assert_eq!(credentials.source, CredentialSource::Local);
}

#[tokio::test]
async fn test_unreachable_service_falls_back_to_local() {
    let uri = closed_port_uri();

    let credentials = CredentialResolver::new(settings(&uri, Some("sk-local-999888")))
        .resolve()
        .await;
    assert_eq!(credentials.source, CredentialSource::Local);
}

#[tokio::test]
async fn test_slow_service_is_abandoned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CREDENTIALS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"api_key": "sk-too-late-1234"}))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let credentials = CredentialResolver::new(settings(&server.uri(), Some("sk-local-999888")))
        .resolve()
        .await;

    assert_eq!(credentials.source, CredentialSource::Local);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_no_credentials_anywhere() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let resolver = CredentialResolver::new(settings(&server.uri(), None));
    let credentials = resolver.resolve().await;

    assert_eq!(credentials.api_key, None);
    assert_eq!(credentials.source, CredentialSource::None);
    let err = credentials.validate().unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY not found"));

    let info = resolver.credentials_info(&credentials);
    assert!(!info.openai_api_key_set);
    assert_eq!(info.openai_api_key_length, 0);
    assert!(!info.config_file_exists);
    assert_eq!(info.credential_source, CredentialSource::None);

    assert!(OpenAiClient::from_credentials(&credentials, resolver.settings()).is_err());
}

#[tokio::test]
async fn test_unprefixed_key_is_resolved_but_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = CredentialResolver::new(settings(&server.uri(), Some("your_key_here")));
    let credentials = resolver.resolve().await;

    assert_eq!(credentials.source, CredentialSource::Local);
    assert!(!credentials.is_valid());
    match OpenAiClient::from_credentials(&credentials, resolver.settings()) {
        Err(err) => assert!(err.to_string().contains("start with 'sk-'")),
        Ok(client) => panic!("placeholder key produced a client: {client:?}"),
    }
}
