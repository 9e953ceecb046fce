//! Car-buying analysis request.
//!
//! [`SubmitRequirements`] is the raw submission body; every field is
//! optional at the serde level so that missing fields surface as a
//! validation error (HTTP 400) rather than a deserialization rejection.
//! [`SubmitRequirements::validate`] produces the [`AnalysisRequest`] that
//! the rest of the system works with.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Message returned when any required field is missing or blank.
pub const MSG_ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Raw submission body for `POST /submit_requirements`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequirements {
    pub user_requirements: Option<String>,
    pub car_type: Option<String>,
    pub budget_range: Option<String>,
    pub current_state: Option<String>,
}

/// A validated analysis request. All four fields are non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Free-text requirements, comma separated (e.g. `"black, 50000 miles, cash"`).
    pub user_requirements: String,
    /// Vehicle type (e.g. `"SUV"`).
    pub car_type: String,
    /// Budget range (e.g. `"$20,000 - $30,000"`).
    pub budget_range: String,
    /// The buyer's home state, used for registration guidance.
    pub current_state: String,
}

impl SubmitRequirements {
    /// Validate that all four fields are present and non-blank.
    ///
    /// Values are trimmed. A field containing only whitespace counts as
    /// missing.
    pub fn validate(self) -> Result<AnalysisRequest, CoreError> {
        fn required(value: Option<String>) -> Result<String, CoreError> {
            match value.map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(CoreError::Validation(MSG_ALL_FIELDS_REQUIRED.to_string())),
            }
        }

        Ok(AnalysisRequest {
            user_requirements: required(self.user_requirements)?,
            car_type: required(self.car_type)?,
            budget_range: required(self.budget_range)?,
            current_state: required(self.current_state)?,
        })
    }
}
