//! Handlers for analysis submission and per-session queries.
//!
//! Submission validates, registers and starts a job, then returns
//! immediately. Everything after that is observed by polling.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use carbuy_core::job::JobRecord;
use carbuy_core::request::SubmitRequirements;
use carbuy_engine::RegistryError;
use serde::Serialize;

use crate::error::{AppError, AppResult, MSG_RESULTS_NOT_FOUND};
use crate::state::AppState;

/// Message returned with a freshly started session.
pub const MSG_SUBMITTED: &str = "Analysis started successfully";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session_id: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub results: String,
    pub status: JobRecord,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /submit_requirements
///
/// Start an analysis for the submitted requirements. Fails with 400 when
/// the analysis credentials are missing, the body is not valid JSON, or any
/// field is blank; no session is created in those cases.
pub async fn submit_requirements(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequirements>, JsonRejection>,
) -> AppResult<Json<SubmitResponse>> {
    state
        .engine_config()
        .check_environment()
        .map_err(AppError::BadRequest)?;

    let Json(input) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let request = input.validate()?;

    let record = state.executor.submit(request).await?;

    tracing::info!(
        session_id = %record.session_id,
        car_type = %record.request.car_type,
        state = %record.request.current_state,
        "Analysis submitted",
    );

    Ok(Json(SubmitResponse {
        session_id: record.session_id,
        message: MSG_SUBMITTED,
    }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /status/{session_id}
///
/// Current snapshot of the session's job record.
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<JobRecord>> {
    let record = state.registry.get(&session_id).await?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Snapshot and report text, or `Results not found` when the session is
/// unknown or has no result yet.
async fn find_results(state: &AppState, session_id: &str) -> AppResult<(String, JobRecord)> {
    let record = state
        .registry
        .get(session_id)
        .await
        .map_err(|e| match e {
            RegistryError::NotFound(_) => AppError::NotFound(MSG_RESULTS_NOT_FOUND),
            other => other.into(),
        })?;

    let results = record
        .result
        .clone()
        .ok_or(AppError::NotFound(MSG_RESULTS_NOT_FOUND))?;
    Ok((results, record))
}

/// GET /results/{session_id}
pub async fn get_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ResultsResponse>> {
    let (results, status) = find_results(&state, &session_id).await?;
    Ok(Json(ResultsResponse { results, status }))
}

/// GET /results/{session_id}/page
///
/// The report as a standalone HTML page. Missing results are a plain-text
/// 404 since the consumer is a browser.
pub async fn results_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match find_results(&state, &session_id).await {
        Ok((results, _)) => Html(render_report_page(&session_id, &results)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, MSG_RESULTS_NOT_FOUND).into_response(),
    }
}

fn render_report_page(session_id: &str, report: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Car Buying Report</title>\n\
         </head>\n\
         <body>\n\
         <h1>Car Buying Report</h1>\n\
         <p>Session: {session}</p>\n\
         <pre>{report}</pre>\n\
         </body>\n\
         </html>\n",
        session = escape_html(session_id),
        report = escape_html(report),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
