//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use waav_controllers::{
    AppState, ControllerLoader, LoadReport, ServerConfig,
    controller::{ClassTable, ControllerModule},
    discovery::StaticSource,
};

/// Load `modules` against `classes` and return the final router
pub async fn load_app(
    state: Arc<AppState>,
    classes: ClassTable,
    modules: Vec<ControllerModule>,
) -> (Router, LoadReport) {
    let mut loader = ControllerLoader::new(state)
        .with_classes(classes)
        .with_source(StaticSource::new(modules));
    loader.attach(Router::new());
    let report = loader.load_all().await;
    (loader.into_router(), report)
}

pub fn default_state() -> Arc<AppState> {
    AppState::new(ServerConfig::default())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn send_text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = send(app, request).await;
    let status = response.status();
    (status, body_string(response).await)
}

pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send_text(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}
