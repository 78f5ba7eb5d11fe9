use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use medipoldao_backend::{config::AppConfig, router, store::MemoryStore, AppState};

pub const SECRET: &str = "integration-secret";
pub const ADMIN: &str = "99999999990";

pub fn app() -> Router {
    let config = AppConfig {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        token_ttl_days: 7,
        db_pool_size: 1,
        admin_tckns: vec![ADMIN.to_string()],
    };
    router(AppState::new(config, Arc::new(MemoryStore::new())))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

/// Registers `tckn` and returns a bearer token for it.
pub async fn register(app: &Router, tckn: &str) -> String {
    let (status, _) = post(
        app,
        "/set_user",
        None,
        serde_json::json!({ "tckn": tckn, "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(app, "/user_jwt", None, serde_json::json!({ "tckn": tckn })).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}
