#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Notify;
use tower::ServiceExt;

use carbuy_api::config::ServerConfig;
use carbuy_api::router::build_app_router;
use carbuy_api::state::AppState;
use carbuy_core::report::StandardReportFormatter;
use carbuy_engine::{
    AnalysisEngine, AnalysisError, AnalysisFactory, AnalysisInputs, AnalysisVariant,
    EngineConfig, JobExecutor, JobRegistry,
};

/// Transcript returned by [`StubEngine`] on success.
pub const STUB_TRANSCRIPT: &str = "Detailed Reasons\nThe <Toyota RAV4> fits the budget.";

/// Build a test `ServerConfig` with safe defaults and a configured
/// analysis key.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        registry_retention_secs: 3600,
        registry_max_records: 100,
        registry_reap_interval_secs: 300,
        engine: EngineConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..EngineConfig::default()
        },
    }
}

/// Collaborator stand-in that answers immediately.
pub struct StubEngine {
    pub outcome: Result<&'static str, &'static str>,
}

#[async_trait]
impl AnalysisEngine for StubEngine {
    async fn run_analysis(&self, _inputs: &AnalysisInputs) -> Result<String, AnalysisError> {
        self.outcome
            .map(str::to_string)
            .map_err(|msg| AnalysisError::Failed(msg.to_string()))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub struct StubFactory {
    pub outcome: Result<&'static str, &'static str>,
}

impl AnalysisFactory for StubFactory {
    fn build(&self) -> Result<Arc<dyn AnalysisEngine>, AnalysisError> {
        Ok(Arc::new(StubEngine {
            outcome: self.outcome,
        }))
    }

    fn variant(&self) -> AnalysisVariant {
        AnalysisVariant::Fallback
    }
}

/// Collaborator that holds every analysis until its gate is notified.
pub struct GatedFactory {
    pub gate: Arc<Notify>,
}

struct GatedEngine {
    gate: Arc<Notify>,
}

#[async_trait]
impl AnalysisEngine for GatedEngine {
    async fn run_analysis(&self, _inputs: &AnalysisInputs) -> Result<String, AnalysisError> {
        self.gate.notified().await;
        Ok(STUB_TRANSCRIPT.to_string())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

impl AnalysisFactory for GatedFactory {
    fn build(&self) -> Result<Arc<dyn AnalysisEngine>, AnalysisError> {
        Ok(Arc::new(GatedEngine {
            gate: Arc::clone(&self.gate),
        }))
    }

    fn variant(&self) -> AnalysisVariant {
        AnalysisVariant::Fallback
    }
}

/// Test application plus a handle on its registry.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<JobRegistry>,
}

pub fn build_test_app_with(
    config: ServerConfig,
    outcome: Result<&'static str, &'static str>,
) -> TestApp {
    build_test_app_with_factory(config, Arc::new(StubFactory { outcome }))
}

pub fn build_test_app_with_factory(
    config: ServerConfig,
    factory: Arc<dyn AnalysisFactory>,
) -> TestApp {
    let registry = Arc::new(JobRegistry::new());
    let executor = JobExecutor::new(
        Arc::clone(&registry),
        factory,
        Arc::new(StandardReportFormatter),
        Some(Duration::from_secs(5)),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        executor,
    };

    TestApp {
        router: build_app_router(state, &config),
        registry,
    }
}

/// Build the full application router with a collaborator that succeeds.
///
/// Uses the same `build_app_router` as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(), Ok(STUB_TRANSCRIPT))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, &json.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Poll `/status/{id}` until the job is terminal, returning the last body.
pub async fn poll_until_terminal(app: &Router, session_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app.clone(), &format!("/status/{session_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["status"] == "completed" || json["status"] == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session {session_id} never finished");
}

pub fn valid_submission() -> serde_json::Value {
    serde_json::json!({
        "user_requirements": "black, 50000 miles, cash, commute, next month, clean title",
        "car_type": "SUV",
        "budget_range": "$20,000 - $30,000",
        "current_state": "California",
    })
}
