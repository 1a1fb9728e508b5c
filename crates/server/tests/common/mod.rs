//! Common test utilities for API testing.
//!
//! This module provides a test fixture that creates an in-process router
//! over a live engine task with recording actuators, so requests travel the
//! same path they do in production without any hardware attached.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use orrery_core::{
    audit::{create_audit_system, AuditStore, MemoryAuditStore},
    testing::MockActuators,
    Config, MemoryPlayerStore,
};
use orrery_server::api::{create_router, WsBroadcaster};
use orrery_server::engine::{spawn_engine, EngineDeps, EngineHandle};
use orrery_server::state::AppState;

/// Test fixture wrapping a router and the engine behind it.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle to the engine, for shutdown tests
    pub engine: EngineHandle,
    /// Every coil command and hardware rule the machine issued
    pub actuators: Arc<MockActuators>,
    /// Broadcaster behind the WebSocket endpoint
    pub ws_broadcaster: WsBroadcaster,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Fast engine timings with ball search switched off so tests stay
/// deterministic.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
    config.server.port = 0; // Not used for in-process testing
    config.engine.tick_ms = 1;
    config.engine.launch_delay_ms = 1;
    config.engine.ball_search.enabled = false;
    config
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let actuators = MockActuators::new();

        let audit_store: Arc<dyn AuditStore> = Arc::new(MemoryAuditStore::new(1000));
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let ws_broadcaster = WsBroadcaster::default();

        let (engine, _task) = spawn_engine(
            &config,
            EngineDeps {
                actuators: Arc::clone(&actuators) as Arc<dyn orrery_core::Actuators>,
                players: Arc::new(MemoryPlayerStore::new()),
                audit: Some(audit_handle),
                notify: Some(ws_broadcaster.notification_callback()),
            },
        );

        let state = Arc::new(AppState::new(
            config,
            engine.clone(),
            audit_store,
            ws_broadcaster.clone(),
        ));

        Self {
            router: create_router(state),
            engine,
            actuators,
            ws_broadcaster,
        }
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

    /// Fetch the raw text of a non-JSON endpoint.
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
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Poll `/api/v1/status` until `check` holds or the deadline passes.
    /// Returns the last status body seen.
    pub async fn wait_for_status(&self, check: impl Fn(&Value) -> bool) -> Value {
        let mut body = Value::Null;
        for _ in 0..200 {
            body = self.get("/api/v1/status").await.body;
            if check(&body) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        body
    }

    /// Poll the audit endpoint until `min` records of `event_type` are stored.
    pub async fn wait_for_audit(&self, event_type: &str, min: u64) -> Value {
        let path = format!("/api/v1/audit?event_type={}", event_type);
        let mut body = Value::Null;
        for _ in 0..200 {
            body = self.get(&path).await.body;
            if body["total"].as_u64().unwrap_or(0) >= min {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        body
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

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
