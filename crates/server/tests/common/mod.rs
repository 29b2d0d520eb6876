//! Common test utilities for API testing.
//!
//! This module provides a test fixture that creates an in-process server
//! around a real orchestrator wired to the HTTP bridges, so whole update runs
//! can be driven through the API without a network listener.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use updraft_core::{BuildInfo, Config, Connectivity};
use updraft_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use updraft_core::testing::fixtures;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_status() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/update/status").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a started fixture on an unrestricted connection.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let mut config = Config::default();
        config.update.tick_interval_ms = 10;
        config.connectivity.initial = test_config.connectivity;

        let state = Arc::new(AppState::new(config, test_config.build_info));
        if test_config.start {
            state.start();
        }
        let router = create_router(Arc::clone(&state));

        Self { router, state }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Deliver a transport notification.
    pub async fn publish(&self, event: updraft_core::UpdateEvent) -> TestResponse {
        self.post("/api/v1/update/events", serde_json::to_value(event).unwrap())
            .await
    }

    /// Fetch the raw text body of a GET request.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll the status endpoint until `predicate` holds.
    pub async fn wait_for_status<F>(&self, predicate: F) -> Value
    where
        F: Fn(&Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let response = self.get("/api/v1/update/status").await;
            if predicate(&response.body) {
                return response.body;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("Status condition not reached: {}", response.body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Connectivity reported at startup
    pub connectivity: Connectivity,
    /// Enter the update procedure before returning the fixture
    pub start: bool,
    /// Build metadata served by the API
    pub build_info: Option<BuildInfo>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Unrestricted,
            start: true,
            build_info: None,
        }
    }
}

impl TestConfig {
    /// Start on a metered connection.
    pub fn metered() -> Self {
        Self {
            connectivity: Connectivity::Metered,
            ..Default::default()
        }
    }

    /// Leave the procedure unentered.
    pub fn not_started() -> Self {
        Self {
            start: false,
            ..Default::default()
        }
    }
}
