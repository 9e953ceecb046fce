use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` when analyses can run, `unhealthy` otherwise.
    pub status: &'static str,
    /// Result of the credential check, or what is missing.
    pub environment: String,
    /// Whether submissions will be accepted.
    pub crew_available: bool,
    /// Search tooling the analysis runs with: `full`, `reduced` or `fallback`.
    pub analysis_variant: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// GET /health -- reports whether the analysis environment is configured.
///
/// Always 200; an unready environment is reported in the body.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let check = state.engine_config().check_environment();
    let crew_available = check.is_ok();

    Json(HealthResponse {
        status: if crew_available { "healthy" } else { "unhealthy" },
        environment: match check {
            Ok(msg) => msg.to_string(),
            Err(msg) => msg,
        },
        crew_available,
        analysis_variant: state.executor.variant().as_str(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
