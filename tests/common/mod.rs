#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use music_store_api::{config::AppConfig, routes::create_router, state::AppState};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret";

pub fn config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        token_ttl_hours: 1,
        store_timeout_secs: 5,
        data_dir: "data".into(),
    }
}

/// State whose store is never reached: requests rejected by the gate or by
/// validation must not need it.
pub fn offline_state() -> AppState {
    AppState::new(DatabaseConnection::default(), &config("postgres://unused"))
}

pub fn app(state: AppState) -> Router {
    create_router(state)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> (u16, Value) {
    let response: Response<Body> = app.clone().oneshot(req).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
