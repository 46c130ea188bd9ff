//! Request Parameter Tests
//!
//! `get_param` through the global parameter middleware.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use waav_controllers::{
    AppState, ServerConfig,
    controller::{ClassTable, ControllerModule},
    middleware::Params,
    prelude::*,
};

use common::{default_state, get, load_app, post_form, post_json, send_json, send_text};

const SCRIPT: &str = "test<script type=\"text/javascript\">alert('test');</script>";
const SCRIPT_ENCODED: &str =
    "test&lt;script type=&quot;text/javascript&quot;&gt;alert(&#39;test&#39;);&lt;/script&gt;";

/// Echoes a parameter raw and sanitized
struct ParamsController;

#[async_trait]
impl Controller for ParamsController {
    fn new(_state: Arc<AppState>, _deps: Dependencies) -> LoadResult<Self> {
        Ok(ParamsController)
    }

    fn prefix(&self) -> Option<&str> {
        Some("/params")
    }

    async fn init(&mut self, routes: &mut RouteTable<Self>) -> LoadResult<()> {
        routes.add_route(
            RouteDescriptor::new(
                "/:key",
                Action::new(|_this: Arc<Self>, req: RouteRequest| async move {
                    let key = req.path_param("key").unwrap_or_default().to_string();
                    let raw = req.get_param(&key, false);
                    let encoded = req.get_param(&key, true);
                    let cached = req.params().is_cached(&key);
                    Ok(axum::Json(json!({
                        "raw": raw,
                        "encoded": encoded,
                        "cached": cached,
                    })))
                }),
            )
            .with_method("all"),
        )
    }
}

fn classes() -> ClassTable {
    ClassTable::new().with(ControllerClass::of::<ParamsController>("ParamsController"))
}

fn module() -> ControllerModule {
    ControllerModule::descriptor(
        "plugins/test/controllers/params",
        json!({ "controller": "ParamsController" }),
    )
}

fn form_encode(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[tokio::test]
async fn test_form_string_sanitized() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let body = form_encode(&[("test", SCRIPT)]);
    let (status, value) = send_json(&app, post_form("/params/test", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["raw"], SCRIPT);
    assert_eq!(value["encoded"], SCRIPT_ENCODED);
    assert_eq!(value["cached"], true);
}

#[tokio::test]
async fn test_form_object_sanitized_recursively() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let body = form_encode(&[("test[<b>]", SCRIPT), ("test[plain]", "ok")]);
    let (_, value) = send_json(&app, post_form("/params/test", &body)).await;

    assert_eq!(value["raw"], json!({ "<b>": SCRIPT, "plain": "ok" }));
    assert_eq!(
        value["encoded"],
        json!({ "&lt;b&gt;": SCRIPT_ENCODED, "plain": "ok" })
    );
}

#[tokio::test]
async fn test_json_body_params() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let (_, value) = send_json(
        &app,
        post_json("/params/test", json!({ "test": ["<i>", 1, { "k": "a&b" }] })),
    )
    .await;

    assert_eq!(value["encoded"], json!(["&lt;i&gt;", 1, { "k": "a&amp;b" }]));
}

#[tokio::test]
async fn test_query_wins_over_body() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let (_, value) = send_json(&app, post_form("/params/test?test=query", "test=body")).await;
    assert_eq!(value["raw"], "query");
}

#[tokio::test]
async fn test_absent_param() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let (status, value) = send_json(&app, get("/params/missing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["raw"], serde_json::Value::Null);
    assert_eq!(value["encoded"], serde_json::Value::Null);
    assert_eq!(value["cached"], false);
}

#[tokio::test]
async fn test_deeply_nested_form_key_served_normally() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let body = format!("a{}=x", "[]".repeat(400_000));
    let (status, value) = send_json(&app, post_form("/params/test", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["raw"], serde_json::Value::Null);

    // Unrouted paths go through the same middleware
    let (status, _) = send_text(&app, post_form("/nowhere", &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_ascii_param_encoded() {
    let (app, _) = load_app(default_state(), classes(), vec![module()]).await;

    let body = form_encode(&[("test", "café <b>")]);
    let (_, value) = send_json(&app, post_form("/params/test", &body)).await;
    assert_eq!(value["raw"], "café <b>");
    assert_eq!(value["encoded"], "caf&#233; &lt;b&gt;");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = ServerConfig::default();
    config.controllers.max_param_body_bytes = 16;
    let (app, _) = load_app(AppState::new(config), classes(), vec![module()]).await;

    let long = "x".repeat(64);
    let body = form_encode(&[("test", long.as_str())]);
    let (status, _) = send_text(&app, post_form("/params/test", &body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_params_extractor_on_host_route() {
    let state = default_state();
    let mut loader = waav_controllers::ControllerLoader::new(state)
        .with_classes(classes())
        .with_source(waav_controllers::discovery::StaticSource::new(vec![]));
    loader.attach(axum::Router::new().route(
        "/host",
        axum::routing::post(|params: Params| async move {
            params.get_str("name").unwrap_or_default()
        }),
    ));
    loader.load_all().await;
    let app = loader.into_router();

    let request = Request::builder()
        .method("POST")
        .uri("/host")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("name=%3Cb%3E"))
        .unwrap();
    let (status, body) = send_text(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "&lt;b&gt;");
}
