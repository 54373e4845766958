#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use wiremock::MockServer;

use intel_desk::{
    config::Settings,
    server::{router, AppState},
};

pub const MORALIS_KEY: &str = "test-moralis-key";
pub const GEMINI_KEY: &str = "test-gemini-key";

/// Every upstream points at `server`; no retries and no paging delay.
pub fn settings_for(server: &MockServer) -> Settings {
    let uri = server.uri();
    Settings {
        moralis_api_key: Some(MORALIS_KEY.to_string()),
        moralis_base_url: format!("{uri}/moralis"),
        solana_rpc_url: format!("{uri}/rpc"),
        coingecko_base_url: format!("{uri}/coingecko"),
        dexscreener_base_url: format!("{uri}/dexscreener"),
        gemini_api_key: Some(GEMINI_KEY.to_string()),
        gemini_base_url: format!("{uri}/gemini"),
        swap_page_delay_ms: 0,
        http_max_retries: 0,
        http_timeout_secs: 5,
        ..Settings::default()
    }
}

pub fn app(settings: Settings) -> Router {
    router(AppState::from_settings(settings).expect("state"))
}

pub async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

pub async fn get_json(app: Router, path: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
}
