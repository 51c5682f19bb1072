//! Integration tests against in-process stub servers.
//!
//! Each test binds an axum router on `127.0.0.1:0` that imitates the Ollama
//! or Anthropic endpoint it needs, so no model or network access is required.
//!
//! Run with:
//!   cargo test --test conversion

use axum::{
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use xmlfill::{
    convert, convert_to_file, probe, ConnectionSettings, ConversionConfig, ConversionRequest,
    ErrorKind, ProviderKind, SUCCESS_STATUS,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

const INVOICE_TEXT: &str = "Invoice #123, total $45.00";
const INVOICE_TEMPLATE: &str = "<invoice><number/><total/></invoice>";
const INVOICE_FILLED: &str = "<invoice><number>123</number><total>45.00</total></invoice>";

/// What a stub saw and what it should answer.
#[derive(Clone, Default)]
struct Stub {
    hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_headers: Arc<Mutex<Option<HeaderMap>>>,
    last_query: Arc<Mutex<Option<String>>>,
    status: u16,
    reply: Value,
    delay: Duration,
}

impl Stub {
    fn replying(reply: Value) -> Self {
        Self {
            status: 200,
            reply,
            ..Self::default()
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn body(&self) -> Value {
        self.last_body.lock().unwrap().clone().unwrap_or(Value::Null)
    }
}

async fn record(
    State(stub): State<Stub>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_body.lock().unwrap() = Some(body);
    *stub.last_headers.lock().unwrap() = Some(headers);
    *stub.last_query.lock().unwrap() = query;
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    let status = StatusCode::from_u16(stub.status).unwrap();
    (status, Json(stub.reply.clone()))
}

async fn tags(State(stub): State<Stub>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(stub.status).unwrap();
    (status, Json(stub.reply.clone()))
}

/// Route library logs to the test harness; `RUST_LOG=xmlfill=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serve `stub` as both Ollama and Anthropic; returns the base URL.
async fn spawn(stub: Stub) -> String {
    init_tracing();
    let app = Router::new()
        .route("/api/generate", post(record))
        .route("/api/tags", get(tags))
        .route("/v1/messages", post(record))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Write the invoice document and template into `dir`.
fn invoice_files(dir: &Path) -> (PathBuf, PathBuf) {
    let doc = dir.join("invoice.txt");
    let tpl = dir.join("invoice.xml");
    std::fs::write(&doc, INVOICE_TEXT).unwrap();
    std::fs::write(&tpl, INVOICE_TEMPLATE).unwrap();
    (doc, tpl)
}

fn cloud_config(base_url: &str) -> ConversionConfig {
    ConversionConfig::builder()
        .anthropic_url(base_url)
        .build()
        .unwrap()
}

// ── Local provider ───────────────────────────────────────────────────────────

#[tokio::test]
async fn local_conversion_strips_fences_and_writes_file() {
    let stub = Stub::replying(json!({ "response": format!("```xml\n{INVOICE_FILLED}\n```") }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());
    let out = dir.path().join("filled_template.xml");

    let request = ConversionRequest::new(doc, tpl, ConnectionSettings::local(&url, "llama3.1"));
    let outcome = convert_to_file(&request, &ConversionConfig::default(), &out).await;

    assert_eq!(outcome.status, SUCCESS_STATUS);
    assert_eq!(outcome.output.as_deref(), Some(INVOICE_FILLED));
    assert_eq!(outcome.saved_to.as_deref(), Some(out.as_path()));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), INVOICE_FILLED);
    assert_eq!(stub.hits(), 1);

    assert_eq!(outcome.stats.provider, Some(ProviderKind::Local));
    assert_eq!(outcome.stats.model.as_deref(), Some("llama3.1"));
    assert_eq!(outcome.stats.output_chars, INVOICE_FILLED.len());
    assert!(outcome.stats.raw_output_chars > outcome.stats.output_chars);
}

#[tokio::test]
async fn local_request_carries_prompt_and_sampling_options() {
    let stub = Stub::replying(json!({ "response": INVOICE_FILLED }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let request = ConversionRequest::new(doc, tpl, ConnectionSettings::local(&url, "mistral"));
    let outcome = convert(&request, &ConversionConfig::default()).await;
    assert!(outcome.is_success(), "{}", outcome.status);

    let body = stub.body();
    assert_eq!(body["model"], "mistral");
    assert_eq!(body["stream"], false);
    assert_eq!(body["options"]["num_predict"], 2000);
    let temperature = body["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.1).abs() < 1e-6);
    let top_p = body["options"]["top_p"].as_f64().unwrap();
    assert!((top_p - 0.9).abs() < 1e-6);

    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("DOCUMENT CONTENT:"));
    assert!(prompt.contains(INVOICE_TEXT));
    assert!(prompt.contains(INVOICE_TEMPLATE));
    assert!(prompt.trim_end().ends_with("Please provide the filled XML template now:"));
}

#[tokio::test]
async fn local_http_error_reports_status_code() {
    let stub = Stub {
        status: 500,
        reply: json!({ "error": "model crashed" }),
        ..Stub::default()
    };
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());
    let out = dir.path().join("filled_template.xml");

    let request = ConversionRequest::new(doc, tpl, ConnectionSettings::local(&url, "llama3.1"));
    let outcome = convert_to_file(&request, &ConversionConfig::default(), &out).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Provider));
    assert_eq!(outcome.status, "❌ Ollama API error: 500");
    assert!(!out.exists());
}

#[tokio::test]
async fn slow_model_times_out() {
    let stub = Stub {
        delay: Duration::from_secs(3),
        ..Stub::replying(json!({ "response": INVOICE_FILLED }))
    };
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let config = ConversionConfig::builder()
        .generate_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let request = ConversionRequest::new(doc, tpl, ConnectionSettings::local(&url, "llama3.1"));
    let outcome = convert(&request, &config).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Timeout));
    assert!(outcome.status.contains("smaller/faster model"));
}

#[tokio::test]
async fn fence_only_response_is_empty() {
    let stub = Stub::replying(json!({ "response": "```xml\n```" }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let request = ConversionRequest::new(doc, tpl, ConnectionSettings::local(&url, "llama3.1"));
    let outcome = convert(&request, &ConversionConfig::default()).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::EmptyResponse));
    assert_eq!(outcome.status, "❌ Model returned empty response");
}

#[tokio::test]
async fn validation_failures_never_reach_the_server() {
    let stub = Stub::replying(json!({ "response": INVOICE_FILLED }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    // No template.
    let request = ConversionRequest {
        document: Some(doc.clone()),
        template: None,
        settings: ConnectionSettings::local(&url, "llama3.1"),
    };
    let outcome = convert(&request, &ConversionConfig::default()).await;
    assert_eq!(outcome.status, "❌ Please upload both document and XML template");

    // No model selected.
    let request = ConversionRequest::new(&doc, &tpl, ConnectionSettings::local(&url, ""));
    let outcome = convert(&request, &ConversionConfig::default()).await;
    assert_eq!(outcome.status, "❌ Please select an Ollama model");
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));

    // No API key.
    let settings = ConnectionSettings::cloud("", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(&doc, &tpl, settings);
    let outcome = convert(&request, &cloud_config(&url)).await;
    assert_eq!(outcome.status, "❌ Please enter your Anthropic API key");

    assert_eq!(stub.hits(), 0);
}

// ── Cloud provider ───────────────────────────────────────────────────────────

#[tokio::test]
async fn cloud_request_sends_key_in_header_only() {
    let stub = Stub::replying(json!({
        "content": [{ "type": "text", "text": format!("```xml\n{INVOICE_FILLED}\n```") }]
    }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let settings = ConnectionSettings::cloud("sk-ant-test-key", "claude-opus-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert(&request, &cloud_config(&url)).await;

    assert_eq!(outcome.status, SUCCESS_STATUS);
    assert_eq!(outcome.output.as_deref(), Some(INVOICE_FILLED));
    assert_eq!(outcome.stats.provider, Some(ProviderKind::Cloud));

    let headers = stub.last_headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers["x-api-key"], "sk-ant-test-key");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert!(stub.last_query.lock().unwrap().is_none());

    let body = stub.body();
    assert_eq!(body["model"], "claude-opus-4-20250514");
    assert_eq!(body["max_tokens"], 4000);
    assert_eq!(body["messages"][0]["role"], "user");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains(INVOICE_TEMPLATE));
    assert!(!body.to_string().contains("sk-ant-test-key"));
}

#[tokio::test]
async fn cloud_error_includes_response_body() {
    let stub = Stub {
        status: 401,
        reply: json!({ "error": { "type": "authentication_error" } }),
        ..Stub::default()
    };
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let settings = ConnectionSettings::cloud("sk-ant-bad", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert(&request, &cloud_config(&url)).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Provider));
    assert!(outcome.status.starts_with("❌ Anthropic API error: 401 - "));
    assert!(outcome.status.contains("authentication_error"));
    assert!(!outcome.status.contains("sk-ant-bad"));
}

#[tokio::test]
async fn cloud_error_with_broken_body_still_reports_status() {
    init_tracing();
    // Headers arrive, then the body stream dies halfway through.
    async fn broken() -> impl IntoResponse {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"error\":")),
            Err(std::io::Error::other("connection reset")),
        ];
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Body::from_stream(futures::stream::iter(chunks)),
        )
    }
    let app = Router::new().route("/v1/messages", post(broken));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let settings = ConnectionSettings::cloud("sk-ant-x", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert(&request, &cloud_config(&url)).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Provider));
    assert!(outcome.status.starts_with("❌ Anthropic API error: 500 - "));
    assert!(outcome.status.contains("unreadable body"));
}

#[tokio::test]
async fn cloud_without_content_blocks_is_empty() {
    let stub = Stub::replying(json!({ "content": [] }));
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let settings = ConnectionSettings::cloud("sk-ant-x", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert(&request, &cloud_config(&url)).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::EmptyResponse));
}

#[tokio::test]
async fn cloud_slow_model_times_out() {
    let stub = Stub {
        delay: Duration::from_secs(3),
        ..Stub::replying(json!({ "content": [{ "type": "text", "text": INVOICE_FILLED }] }))
    };
    let url = spawn(stub.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());

    let config = ConversionConfig::builder()
        .anthropic_url(&url)
        .cloud_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let settings = ConnectionSettings::cloud("sk-ant-x", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert(&request, &config).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Timeout));
    assert!(outcome.status.contains("Anthropic"));
    assert!(outcome.status.contains("smaller/faster model"));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn cloud_unreachable_is_generic_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (doc, tpl) = invoice_files(dir.path());
    let out = dir.path().join("filled_template.xml");

    // Port 9 (discard) on localhost has no HTTP server.
    let settings = ConnectionSettings::cloud("sk-ant-x", "claude-sonnet-4-20250514");
    let request = ConversionRequest::new(doc, tpl, settings);
    let outcome = convert_to_file(&request, &cloud_config("http://127.0.0.1:9"), &out).await;

    assert!(outcome.output.is_none());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Unclassified));
    assert!(outcome.status.starts_with("❌ Error calling Anthropic"));
    assert!(!outcome.status.contains("sk-ant-x"));
    assert!(!out.exists());
}

// ── Probe ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn probe_lists_models_in_server_order() {
    let stub = Stub::replying(json!({
        "models": [
            { "name": "llama3.1:latest", "size": 4_661_224_676u64 },
            { "name": "mistral:latest", "size": 4_113_301_824u64 }
        ]
    }));
    let url = spawn(stub.clone()).await;

    let report = probe(&url, &ConversionConfig::default()).await;
    assert!(report.connected);
    assert_eq!(report.model_count(), 2);
    assert_eq!(report.models, vec!["llama3.1:latest", "mistral:latest"]);
    assert_eq!(
        report.status,
        "✅ Connected! Found 2 model(s): llama3.1:latest, mistral:latest"
    );
}

#[tokio::test]
async fn probe_counts_plain_model_names() {
    let stub = Stub::replying(json!({
        "models": [{ "name": "llama3.1" }, { "name": "mistral" }]
    }));
    let url = spawn(stub.clone()).await;

    let report = probe(&url, &ConversionConfig::default()).await;
    assert!(report.connected);
    assert_eq!(report.model_count(), 2);
    assert_eq!(report.models, vec!["llama3.1", "mistral"]);
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn probe_non_200_cannot_connect() {
    let stub = Stub {
        status: 503,
        reply: json!({}),
        ..Stub::default()
    };
    let url = spawn(stub.clone()).await;

    let report = probe(&url, &ConversionConfig::default()).await;
    assert!(!report.connected);
    assert!(report.models.is_empty());
    assert_eq!(report.status, "❌ Cannot connect to Ollama");
}

#[tokio::test]
async fn probe_unreachable_reports_error() {
    let report = probe("http://127.0.0.1:9", &ConversionConfig::default()).await;
    assert!(!report.connected);
    assert!(report.status.starts_with("❌ Error: "));
}
