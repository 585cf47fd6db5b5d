use crate::{
    config::Config,
    mcp::handler::McpHandler,
    security::DataRoot,
    server::{build_router, AppState},
    sessions::SESSION_BUFFER,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(cfg: Config) -> (tempfile::TempDir, Router) {
    let tmp = tempfile::tempdir().unwrap();
    let root = DataRoot::prepare(&tmp.path().join("data")).unwrap();
    std::fs::write(tmp.path().join("secrets.txt"), "do not read").unwrap();
    let handler = McpHandler::new(&cfg, root);
    (tmp, build_router(AppState::new(cfg, handler)))
}

fn app() -> (tempfile::TempDir, Router) { app_with(Config::default()) }

fn post_json(uri: &str, body: Value) -> Request<Body> {
    let raw = body.to_string();
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let req = post_json("/mcp", json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params}));
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

fn resource_body(out: &Value) -> Value {
    serde_json::from_str(out["result"]["contents"][0]["text"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let (_tmp, app) = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "Render Hosted MCP");
    assert_eq!(body["version"], "1.0.0");
    assert!(body["time"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn reads_seed_file() {
    let (_tmp, app) = app();
    let out = rpc(&app, "resources/read", json!({"uri": "file://hello.txt"})).await;
    assert_eq!(
        resource_body(&out),
        json!({"path": "hello.txt", "size": 34, "contents": "Hello from the hosted MCP server!\n"})
    );
}

#[tokio::test]
async fn traversal_is_denied_over_http() {
    let (_tmp, app) = app();
    let out = rpc(&app, "resources/read", json!({"uri": "file://../secrets.txt"})).await;
    let body = resource_body(&out);
    assert_eq!(body["error"], "Access denied: path must be inside data root.");
    assert!(!out.to_string().contains("do not read"));
}

#[tokio::test]
async fn missing_file_is_reported() {
    let (_tmp, app) = app();
    let out = rpc(&app, "resources/read", json!({"uri": "file://missing.txt"})).await;
    assert_eq!(resource_body(&out)["error"], "File not found: missing.txt");
}

#[tokio::test]
async fn calculator_divide_by_zero() {
    let (_tmp, app) = app();
    let args = json!({"operation": "divide", "a": 10, "b": 0});
    let out = rpc(&app, "tools/call", json!({"name": "calculator", "arguments": args})).await;
    assert_eq!(out["result"]["isError"], true);
    assert!(out["result"]["structuredContent"]["result"].is_null());
}

#[tokio::test]
async fn echo_over_http() {
    let (_tmp, app) = app();
    let args = json!({"text": "hey", "repeat": 2});
    let out = rpc(&app, "tools/call", json!({"name": "echo", "arguments": args})).await;
    assert_eq!(out["result"]["structuredContent"]["repeated"], "hey hey");
    assert_eq!(out["result"]["content"][0]["type"], "text");
}

#[tokio::test]
async fn notification_is_accepted_without_body() {
    let (_tmp, app) = app();
    let req = post_json("/mcp", json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn oversized_body_rejected() {
    let mut cfg = Config::default();
    cfg.limits.max_request_kb = 1;
    let (_tmp, app) = app_with(cfg);
    let big = "x".repeat(4096);
    let req = post_json("/mcp", json!({"jsonrpc": "2.0", "id": 1, "method": "ping", "params": {"pad": big}}));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn message_to_unknown_session_is_404() {
    let (_tmp, app) = app();
    let uri = format!("/message?session_id={}", uuid::Uuid::new_v4());
    let resp = app.oneshot(post_json(&uri, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["code"], "SessionNotFound");
}

async fn next_event(stream: &mut axum::body::BodyDataStream) -> String {
    let mut buf = String::new();
    while !buf.contains("\n\n") {
        let chunk = stream.next().await.unwrap().unwrap();
        buf.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    buf
}

fn event_data(frame: &str) -> &str {
    frame.lines().find_map(|l| l.strip_prefix("data: ")).unwrap()
}

#[tokio::test]
async fn sse_session_roundtrip() {
    let (_tmp, app) = app();
    let req = Request::builder().uri("/sse").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mut stream = resp.into_body().into_data_stream();

    let first = next_event(&mut stream).await;
    assert!(first.contains("event: endpoint"));
    let endpoint = event_data(&first).to_string();
    assert!(endpoint.starts_with("/message?session_id="));

    let req = post_json(&endpoint, json!({"jsonrpc": "2.0", "id": "abc", "method": "tools/list"}));
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let second = next_event(&mut stream).await;
    assert!(second.contains("event: message"));
    let msg: Value = serde_json::from_str(event_data(&second)).unwrap();
    assert_eq!(msg["id"], "abc");
    assert_eq!(msg["result"]["tools"].as_array().unwrap().len(), 3);

    drop(stream);
    let resp = app.oneshot(post_json(&endpoint, json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stalled_session_reader_gets_busy_not_blocked() {
    let (_tmp, app) = app();
    let req = Request::builder().uri("/sse").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let mut stream = resp.into_body().into_data_stream();
    let endpoint = event_data(&next_event(&mut stream).await).to_string();

    // nobody reads the stream from here on
    for i in 0..SESSION_BUFFER {
        let req = post_json(&endpoint, json!({"jsonrpc": "2.0", "id": i, "method": "ping"}));
        assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::ACCEPTED);
    }
    let req = post_json(&endpoint, json!({"jsonrpc": "2.0", "id": "over", "method": "ping"}));
    let resp = tokio::time::timeout(std::time::Duration::from_secs(5), app.clone().oneshot(req))
        .await
        .expect("message endpoint blocked on a full session")
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(resp).await["code"], "SessionBusy");

    // draining frees capacity again
    let queued = next_event(&mut stream).await;
    assert_eq!(serde_json::from_str::<Value>(event_data(&queued)).unwrap()["id"], 0);
    let req = post_json(&endpoint, json!({"jsonrpc": "2.0", "id": "again", "method": "ping"}));
    assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::ACCEPTED);
}
