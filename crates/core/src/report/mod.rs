//! Report post-processing.
//!
//! Turns a raw analysis transcript into a complete report: a header with
//! the customer profile, an optional normalized vehicle table, the raw
//! transcript verbatim, and canonical boilerplate for every required
//! section the transcript did not already contain.
//!
//! Formatting is not idempotent. Running it over its own output appends
//! the transcript a second time, so a transcript must be formatted once.

pub mod profile;
pub mod sections;
pub mod table;

use chrono::NaiveDate;

use crate::request::AnalysisRequest;
use profile::CustomerProfile;
use sections::{
    MARKER_DETAILED_REASONS, MARKER_FINAL, MARKER_INSPECTION, MARKER_NEGOTIATION,
    MARKER_REGISTRATION, MARKER_TOP_VEHICLES,
};

/// Report title on the first line of every formatted report.
pub const REPORT_TITLE: &str = "Comprehensive Car Buying Report";

/// Heading for the normalized table when the transcript already has the
/// top-vehicles marker.
pub const RANKED_SUMMARY_HEADING: &str = "Ranked Vehicle Summary";

/// Body emitted in place of a blank transcript.
pub const EMPTY_TRANSCRIPT: &str = "No results generated from the analysis.";

/// Formatter failure. The executor falls back to the raw transcript.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormatError {
    #[error("formatter rejected transcript: {0}")]
    Rejected(String),

    #[error("formatter panicked: {0}")]
    Panicked(String),
}

/// Transcript-to-report transformation used by the job executor.
pub trait ReportFormatter: Send + Sync {
    fn format(&self, raw: &str, request: &AnalysisRequest) -> Result<String, FormatError>;
}

/// The canonical sectioned report, dated with the local calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardReportFormatter;

impl ReportFormatter for StandardReportFormatter {
    fn format(&self, raw: &str, request: &AnalysisRequest) -> Result<String, FormatError> {
        Ok(format_on(raw, request, chrono::Local::now().date_naive()))
    }
}

/// Format `raw` for `request` as of `date`.
pub fn format_on(raw: &str, request: &AnalysisRequest, date: NaiveDate) -> String {
    let mut out = header(request, date);

    let raw_has_table = raw.contains(MARKER_TOP_VEHICLES);
    let mut table_emitted = raw_has_table;
    if table::has_recommendation_fragment(raw) {
        let heading = if raw_has_table {
            RANKED_SUMMARY_HEADING
        } else {
            MARKER_TOP_VEHICLES
        };
        out.push_str(&table::render_ranked_table(raw, heading));
        table_emitted = true;
    }

    if raw.trim().is_empty() {
        out.push_str(EMPTY_TRANSCRIPT);
        out.push('\n');
    } else {
        out.push_str(raw);
    }

    if !table_emitted {
        out.push_str(&sections::top_vehicles(&request.car_type, &request.budget_range));
    }
    if !raw.contains(MARKER_DETAILED_REASONS) {
        out.push_str(&sections::detailed_reasons());
    }
    if !raw.contains(MARKER_REGISTRATION) {
        out.push_str(&sections::registration(&request.current_state));
    }
    if !raw.contains(MARKER_NEGOTIATION) {
        out.push_str(&sections::negotiation());
    }
    if !raw.contains(MARKER_INSPECTION) {
        out.push_str(&sections::inspection());
    }
    if !raw.contains(MARKER_FINAL) {
        out.push_str(&sections::final_recommendations());
    }

    out
}

fn header(request: &AnalysisRequest, date: NaiveDate) -> String {
    let profile = CustomerProfile::extract(&request.user_requirements);

    format!(
        "{REPORT_TITLE}\n\
         Current Date: {date}\n\
         \n\
         Customer Profile\n\
         State: {state}\n\
         Vehicle Type: {car_type}\n\
         Color: {color}\n\
         Mileage: {mileage}\n\
         Budget: {budget}\n\
         Must-Have Features: {must}\n\
         Nice-to-Have Features: {nice}\n\
         Method of Payment: {payment}\n\
         Intended Use: {usage}\n\
         Desired Purchase Date: {purchase}\n\
         Special Consideration: {special}\n\
         \n",
        date = date.format("%B %d, %Y"),
        state = request.current_state,
        car_type = request.car_type,
        color = profile.color,
        mileage = profile.mileage,
        budget = request.budget_range,
        must = profile.must_have_features,
        nice = profile.nice_to_have_features,
        payment = profile.payment_method,
        usage = profile.intended_use,
        purchase = profile.purchase_date,
        special = profile.special_considerations,
    )
}
