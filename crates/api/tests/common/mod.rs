#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use encore_api::config::{LogFormat, ServerConfig};
use encore_api::router::build_app_router;
use encore_api::state::AppState;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a known admin token, and a short lock wait.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        admin_token: Some(ADMIN_TOKEN.to_string()),
        lock_wait_ms: 500,
        event_channel_capacity: 64,
        ws_heartbeat_secs: 30,
        ws_idle_timeout_secs: 90,
        log_format: LogFormat::Plain,
    }
}

/// Fresh state plus the full router over it.
///
/// The router is cheap to clone; clones share the same engine, so a test can
/// issue several `oneshot` calls against one in-memory store.
pub fn build_test_app_with(config: ServerConfig) -> (Router, AppState) {
    let state = AppState::new(config);
    let app = build_app_router(state.clone()).unwrap();
    (app, state)
}

/// Another router over existing state.
pub fn build_app_for(state: &AppState) -> Router {
    build_app_router(state.clone()).unwrap()
}

pub fn build_test_app() -> Router {
    build_test_app_with(test_config()).0
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_with_token(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_with_token(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send_json(app, Method::POST, uri, body).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send_json(app, Method::PATCH, uri, body).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// POST /sessions and return the created session.
pub async fn create_session(app: &Router, name: &str) -> Value {
    let response = post_json(app, "/sessions", serde_json::json!({ "name": name })).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}

/// Submit a request with only a title and return it.
pub async fn submit(app: &Router, session_id: i64, title: &str) -> Value {
    let response = post_json(
        app,
        &format!("/sessions/{session_id}/requests"),
        serde_json::json!({ "song_title": title }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
