//! API parity tests — response shapes the visualizer front end relies on.
//!
//! These build a full router around fake completion and scrape
//! collaborators and drive it with `oneshot` (no socket needed).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use instagraph_core::InstaGraphConfig;
use instagraph_ingest::PageScraper;
use instagraph_llm::{CompletionClient, CompletionError, ToolSpec};
use instagraph_runtime::Orchestrator;
use instagraph_server::{build_router, AppState};
use instagraph_store::{GraphBackend, NoBackend, SqliteBackend};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const GRAPH: &str = r##"{
    "metadata": {"createdDate": "2024-05-01", "lastUpdated": "2024-05-01", "description": "Rust"},
    "nodes": [
        {"id": "rust", "label": "Rust", "type": "Language", "color": "#FFE4B5"},
        {"id": "cargo", "label": "Cargo", "type": "Build Tool", "color": "",
         "properties": {"bundled": true}},
    ],
    "edges": [
        {"from": "cargo", "to": "rust", "relationship": "builds", "direction": "forward", "color": "#D3D3D3"},
    ]
}"##;

/// Scripted completion client.
enum Reply {
    Graph,
    RateLimited,
    Credits,
}

struct FakeClient {
    reply: Reply,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, _prompt: &str, _tool: &ToolSpec) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Graph => Ok(GRAPH.to_string()),
            Reply::RateLimited => Err(CompletionError::RateLimited("429".into())),
            Reply::Credits => Err(CompletionError::InsufficientCredits("402".into())),
        }
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct FakeScraper;

#[async_trait]
impl PageScraper for FakeScraper {
    async fn scrape(&self, _url: &str) -> instagraph_core::Result<String> {
        Ok("Cargo builds Rust crates.".to_string())
    }
}

struct Harness {
    app: Router,
    client: Arc<FakeClient>,
    _dir: TempDir,
}

fn harness(reply: Reply, sqlite: bool, plan: Option<&str>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = InstaGraphConfig::from_env(dir.path()).unwrap();
    config.data_paths.static_dir = dir.path().join("static");
    config.user_plan = plan.map(str::to_string);

    let backend: Arc<dyn GraphBackend> = if sqlite {
        Arc::new(SqliteBackend::open(dir.path().join("history.db")).unwrap())
    } else {
        Arc::new(NoBackend)
    };

    let client = Arc::new(FakeClient {
        reply,
        calls: AtomicUsize::new(0),
    });
    let orchestrator = Orchestrator::new(client.clone(), Arc::new(FakeScraper), backend, "English");
    let app = build_router(Arc::new(AppState::new(config, orchestrator)));

    Harness {
        app,
        client,
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value, axum::http::HeaderMap) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, headers)
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
async fn test_response_data_returns_graph() {
    let h = harness(Reply::Graph, false, None);
    let (status, body, _) = send(
        &h.app,
        post_json("/get_response_data", json!({"user_input": "Cargo builds Rust"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["metadata"]["createdDate"].is_string());
    assert_eq!(body["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(body["nodes"][1]["type"], "Build Tool");
    assert_eq!(body["nodes"][1]["properties"]["bundled"], true);
    let edge = &body["edges"][0];
    assert_eq!(edge["from"], "cargo");
    assert_eq!(edge["to"], "rust");
    assert!(edge.get("source").is_none());
}

#[tokio::test]
async fn test_empty_input_is_bad_request() {
    let h = harness(Reply::Graph, false, None);
    let (status, body, _) =
        send(&h.app, post_json("/get_response_data", json!({"user_input": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input provided");

    let (status, _, _) = send(&h.app, post_json("/get_response_data", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let h = harness(Reply::Graph, false, None);

    let request = Request::builder()
        .method("POST")
        .uri("/get_response_data")
        .header("content-type", "application/json")
        .body(Body::from("user_input=hello"))
        .unwrap();
    let (status, body, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/get_response_data")
        .body(Body::from(r#"{"user_input": "hello"}"#))
        .unwrap();
    let (status, body, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(h.client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_errors_map_to_status() {
    let h = harness(Reply::RateLimited, false, None);
    let (status, body, _) =
        send(&h.app, post_json("/get_response_data", json!({"user_input": "x"}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "API rate limit exceeded. Please try again later.");

    let h = harness(Reply::Credits, false, None);
    let (status, body, _) =
        send(&h.app, post_json("/get_response_data", json!({"user_input": "x"}))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("Insufficient API credits"));
}

#[tokio::test]
async fn test_graph_data_shape() {
    let h = harness(Reply::Graph, false, None);

    let (status, body, _) = send(&h.app, post_json("/get_graph_data", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"elements": {"nodes": [], "edges": []}}));

    let url = json!({"user_input": "https://doc.rust-lang.org"});
    send(&h.app, post_json("/get_response_data", url)).await;
    let (_, body, _) = send(&h.app, post_json("/get_graph_data", json!({}))).await;
    let nodes = body["elements"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["data"], json!({"id": "rust", "label": "Rust", "color": "#FFE4B5"}));
    assert_eq!(nodes[1]["data"]["color"], "defaultColor");
    assert_eq!(
        body["elements"]["edges"][0]["data"],
        json!({"source": "cargo", "target": "rust", "label": "builds", "color": "#D3D3D3"})
    );
}

#[tokio::test]
async fn test_history_without_backend() {
    let h = harness(Reply::Graph, false, None);
    let (status, body, _) = send(&h.app, get("/get_graph_history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"graph_history": [], "error": "Graph driver not initialized", "graph": false})
    );
}

#[tokio::test]
async fn test_history_pages_with_sqlite() {
    let h = harness(Reply::Graph, true, None);
    for _ in 0..11 {
        let (status, _, _) =
            send(&h.app, post_json("/get_response_data", json!({"user_input": "Cargo"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body, _) = send(&h.app, get("/get_graph_history?page=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["graph"], true);
    assert_eq!(body["remaining"], 1);
    let entries = body["graph_history"].as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["seq"], 11);
    assert!(entries[0]["graph"]["nodes"].is_array());

    let (_, body, _) = send(&h.app, get("/get_graph_history?page=2")).await;
    assert_eq!(body["graph_history"].as_array().unwrap().len(), 1);
    assert_eq!(body["remaining"], 0);
}

#[tokio::test]
async fn test_history_page_parameter_is_lenient() {
    let h = harness(Reply::Graph, true, None);
    for _ in 0..3 {
        send(&h.app, post_json("/get_response_data", json!({"user_input": "Cargo"}))).await;
    }

    for uri in ["/get_graph_history?page=abc", "/get_graph_history?page=", "/get_graph_history"] {
        let (status, body, _) = send(&h.app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["graph_history"].as_array().unwrap().len(), 3, "{}", uri);
        assert_eq!(body["graph_history"][0]["seq"], 3, "{}", uri);
    }
}

#[tokio::test]
async fn test_history_page_far_past_end_is_empty() {
    let h = harness(Reply::Graph, true, None);
    for _ in 0..3 {
        send(&h.app, post_json("/get_response_data", json!({"user_input": "Cargo"}))).await;
    }

    let (status, body, _) = send(&h.app, get("/get_graph_history?page=18446744073709551615")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["graph_history"].as_array().unwrap().is_empty());
    assert_eq!(body["remaining"], 0);
}

#[tokio::test]
async fn test_health_report() {
    let h = harness(Reply::Graph, true, None);
    let (status, body, _) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert!(body["version"].is_string());
    assert_eq!(body["services"]["api"], "up");
    assert_eq!(body["services"]["openai"], "configured");
    assert_eq!(body["services"]["database"], "up");
}

#[tokio::test]
async fn test_free_plan_retry_after() {
    let h = harness(Reply::Graph, false, Some("free"));
    let (_, _, headers) = send(&h.app, get("/health")).await;
    assert_eq!(headers.get("retry-after").unwrap(), "20");

    let h = harness(Reply::Graph, false, None);
    let (_, _, headers) = send(&h.app, get("/health")).await;
    assert!(headers.get("retry-after").is_none());
}

#[tokio::test]
async fn test_root_banner_without_static_ui() {
    let h = harness(Reply::Graph, false, None);
    let response = h.app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("InstaGraph"));
}
