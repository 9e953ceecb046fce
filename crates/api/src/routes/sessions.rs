//! Route definitions for analysis sessions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes, mounted at the root.
///
/// ```text
/// POST   /submit_requirements              -> submit_requirements
/// GET    /status/{session_id}              -> get_status
/// GET    /results/{session_id}             -> get_results
/// GET    /results/{session_id}/page        -> results_page
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit_requirements", post(sessions::submit_requirements))
        .route("/status/{session_id}", get(sessions::get_status))
        .route("/results/{session_id}", get(sessions::get_results))
        .route("/results/{session_id}/page", get(sessions::results_page))
}
