//! HTTP console tests, driven in-process through `tower::ServiceExt`.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::{test_config, test_manager, MockNode};
use wallet_session::console::BufferConsole;
use wallet_session::http::{ConsoleState, HttpServer};
use wallet_session::session::SessionStore;

async fn console_app(node: &MockNode) -> (Router, Arc<BufferConsole>) {
    let manager = Arc::new(test_manager(&test_config(node), SessionStore::disabled()));
    manager.initialize().await.unwrap();
    let console = Arc::new(BufferConsole::new(16));
    let state = ConsoleState {
        manager,
        console: console.clone(),
        metrics: None,
    };
    (HttpServer::build_router(state), console)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_status_before_login() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;

    let (status, body) = call(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["accounts"], json!([]));
}

#[tokio::test]
async fn test_not_connected_maps_to_conflict() {
    let node = MockNode::start().await;
    let (app, console) = console_app(&node).await;

    let (status, body) = call(&app, "GET", "/balance", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "provider not initialized yet" }));
    assert_eq!(console.last().unwrap(), "provider not initialized yet");
}

#[tokio::test]
async fn test_login_then_balance_then_logout() {
    let node = MockNode::start().await;
    let (app, console) = console_app(&node).await;

    let (status, body) = call(&app, "POST", "/login", Some(json!({ "login_provider": "line" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["adapter"], "openlogin");

    let (status, body) = call(&app, "GET", "/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["ether"].as_str().unwrap().starts_with("1."));

    let (status, body) = call(&app, "GET", "/user-info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["typeOfLogin"], "line");

    let (status, body) = call(&app, "POST", "/logout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let (status, _) = call(&app, "GET", "/user-info", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call(&app, "GET", "/console", None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), console.entries().len());
}

#[tokio::test]
async fn test_unknown_adapter_is_unauthorized() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;

    let (status, body) = call(
        &app,
        "POST",
        "/login",
        Some(json!({ "adapter": "phantom", "login_provider": "google" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("phantom"));
}

#[tokio::test]
async fn test_sign_defaults_and_recovers() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;
    call(&app, "POST", "/login", Some(json!({ "login_provider": "google" }))).await;

    let (status, body) = call(&app, "POST", "/sign", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "YOUR_MESSAGE");
    assert_eq!(
        body["signer"].as_str().unwrap().to_lowercase(),
        common::DEV_ADDRESS
    );
}

#[tokio::test]
async fn test_bad_send_input_is_bad_request() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;
    call(&app, "POST", "/login", Some(json!({ "login_provider": "google" }))).await;

    let (status, body) = call(
        &app,
        "POST",
        "/send",
        Some(json!({ "amount": "lots", "destination": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid ether amount"));
}

#[tokio::test]
async fn test_private_key_unsupported_for_node_accounts() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;
    let (status, _) = call(
        &app,
        "POST",
        "/login",
        Some(json!({ "adapter": "injected", "login_provider": "metamask" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", "/private-key", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_metrics_disabled() {
    let node = MockNode::start().await;
    let (app, _) = console_app(&node).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
