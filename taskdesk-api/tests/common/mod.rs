//! Common test utilities for HTTP tests
//!
//! Every context owns its own in-memory database, so tests run in parallel
//! without cleanup.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::Config;
use taskdesk_shared::db::Database;
use tower::ServiceExt;

pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE_BACKEND", "memory"),
            ("ARGON2_MEMORY_KIB", "1024"),
            ("ARGON2_ITERATIONS", "1"),
            ("ARGON2_PARALLELISM", "1"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test config");

        let state = AppState::new(Database::in_memory(), config);
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request and returns the status with the parsed JSON body
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a user through the API and returns its id
    pub async fn create_user(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/users",
                json!({ "name": name, "email": email, "password": "password123" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(&self, title: &str, assigned_to: &str, due_date: &str) -> String {
        let (status, body) = self
            .post(
                "/api/tasks",
                json!({
                    "title": title,
                    "description": format!("{} description", title),
                    "dueDate": due_date,
                    "assignedTo": assigned_to,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
