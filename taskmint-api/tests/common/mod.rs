//! Shared helpers for taskmint-api integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use taskmint_api::auth::TokenKeys;
use taskmint_api::extraction::{ExtractionError, LanguageModel};
use taskmint_api::{build_router, AppState};
use taskmint_common::db::init_memory_database;
use tower::util::ServiceExt; // for `oneshot` method

pub const TEST_SECRET: &str = "integration-test-secret";

/// Language model stub answering from a queue of canned responses
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ExtractionError>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn answering(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: ExtractionError) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from([Err(err)])),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _instructions: &str, _transcript: &str) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ExtractionError::EmptyResponse))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Router over a fresh in-memory database
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub model: Arc<ScriptedModel>,
}

impl TestApp {
    pub async fn new(model: Arc<ScriptedModel>) -> Self {
        let db = init_memory_database().await.expect("Should create in-memory database");
        Self::with_pool(db, model)
    }

    pub fn with_pool(db: SqlitePool, model: Arc<ScriptedModel>) -> Self {
        let state = AppState::new(db.clone(), model.clone(), TokenKeys::new(TEST_SECRET, 1).unwrap());
        Self {
            router: build_router(state),
            db,
            model,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send and decode a JSON response
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(request(method, uri, token, body)).await;
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    /// Register an account and return its bearer token
    pub async fn register(&self, email: &str, name: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({ "email": email, "password": "correct horse", "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn count_rows(db: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db)
        .await
        .unwrap()
}
