use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tutor_engine::{
    BackendClient, EndpointResolver, FailureKind, Prober, ResolverSettings, StaticCandidates,
    UploadFile,
};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingProber {
    calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl Prober for RecordingProber {
    async fn probe(&self, base_url: &str, _timeout: Duration) -> bool {
        self.calls.lock().unwrap().push(base_url.to_string());
        true
    }
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "groq_configured": true, "documents": 3})),
        )
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer, settings: ResolverSettings) -> BackendClient {
    let resolver =
        EndpointResolver::http(settings, Arc::new(StaticCandidates::new([server.uri()]))).unwrap();
    BackendClient::new(Arc::new(resolver))
}

fn pdf(bytes: usize) -> UploadFile {
    UploadFile {
        filename: "notes.pdf".to_string(),
        mime: "application/pdf".to_string(),
        bytes: vec![b'%'; bytes],
    }
}

#[tokio::test]
async fn chat_returns_answer() {
    engine_logging::initialize_for_tests();
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"question": "What is entropy?"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": "What do you already know?"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let answer = client.chat("What is entropy?").await.unwrap();

    assert_eq!(answer.answer, "What do you already know?");
}

#[tokio::test]
async fn chat_error_body_is_backend_failure() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Field 'question' required"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let err = client.chat("").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Backend);
    assert_eq!(err.message, "Field 'question' required");
}

#[tokio::test]
async fn chat_server_error_embeds_status_and_body() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let err = client.chat("hi").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "backend error: 500 - Internal Server Error");
    assert_eq!(err.attempted, vec![server.uri()]);
}

#[tokio::test]
async fn chat_reply_without_answer_is_invalid() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let err = client.chat("hi").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn slow_chat_times_out() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let settings = ResolverSettings {
        request_timeout: Duration::from_millis(100),
        ..ResolverSettings::default()
    };
    let client = client_for(&server, settings);
    let err = client.chat("hi").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn upload_sends_multipart_file() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"notes.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"message": "Indexed 12 chunks", "filename": "notes.pdf"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let receipt = client.upload(pdf(1024)).await.unwrap();

    assert_eq!(receipt.message, "Indexed 12 chunks");
    assert_eq!(receipt.filename, "notes.pdf");
}

#[tokio::test]
async fn upload_reply_without_message_uses_fallbacks() {
    let server = backend().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server, ResolverSettings::default());
    let receipt = client.upload(pdf(10)).await.unwrap();

    assert_eq!(receipt.message, "File indexed successfully.");
    assert_eq!(receipt.filename, "notes.pdf");
}

#[tokio::test]
async fn rejected_uploads_never_touch_the_network() {
    let prober = Arc::new(RecordingProber::default());
    let resolver = EndpointResolver::new(
        reqwest::Client::new(),
        ResolverSettings::default(),
        Arc::new(StaticCandidates::new(["http://10.255.255.1:8000"])),
        prober.clone(),
    );
    let client = BackendClient::new(Arc::new(resolver));

    let err = client.upload(pdf(6 * 1024 * 1024)).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::FileTooLarge {
            max_bytes: 5 * 1024 * 1024,
            actual: 6 * 1024 * 1024,
        }
    );

    let exe = UploadFile {
        filename: "setup.exe".to_string(),
        mime: "application/x-msdownload".to_string(),
        bytes: vec![0; 16],
    };
    let err = client.upload(exe).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedFileType {
            mime: "application/x-msdownload".to_string(),
        }
    );

    assert!(prober.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_keeps_unknown_fields() {
    let server = backend().await;
    let client = client_for(&server, ResolverSettings::default());

    let health = client.health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert!(health.groq_configured);
    assert_eq!(health.extra.get("documents"), Some(&json!(3)));
}
