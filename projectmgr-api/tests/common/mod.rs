//! Common test utilities for integration tests
//!
//! - In-memory store behind the full router
//! - Register/login helpers
//! - JSON request helper

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use projectmgr_api::app::{build_router, AppState};
use projectmgr_api::config::Config;
use projectmgr_shared::store::{MemoryStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub const PASSWORD: &str = "password123";

/// Test context: router plus direct access to its store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::with_defaults("postgresql://localhost/unused", JWT_SECRET))
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let app = build_router(AppState::new(dyn_store, config.clone()));

        Self { app, store, config }
    }

    /// Sends a request and returns the status and JSON body (`Null` when empty)
    pub async fn request(
        &self,
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
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` with [`PASSWORD`] and returns the created user
    pub async fn register(&self, username: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/users/register/",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
        body
    }

    /// Logs in and returns the access token
    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/login/",
                None,
                json!({ "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Registers and logs in
    pub async fn register_and_login(&self, username: &str) -> String {
        self.register(username).await;
        self.login(username).await
    }

    /// Creates a project as the token's user and returns it
    pub async fn create_project(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .post("/api/projects/", Some(token), json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create {}: {}", title, body);
        body
    }
}
