//! Best-effort extraction of customer profile fields from free-text
//! requirements.
//!
//! The requirements string is split on commas. Each part is trimmed,
//! lowercased, and assigned to the first category whose keywords it
//! contains. Parts are scanned left to right, so a later part overwrites
//! an earlier one in the same category. Categories nothing matched keep
//! [`NOT_SPECIFIED`].

/// Placeholder for profile fields with no matching requirement.
pub const NOT_SPECIFIED: &str = "Not specified";

const COLOR_KEYWORDS: &[&str] = &["color", "black", "white", "red", "blue"];
const MILEAGE_KEYWORDS: &[&str] = &["mileage", "miles"];
const FEATURE_KEYWORDS: &[&str] = &["sunroof", "camera", "bluetooth"];
const URGENCY_KEYWORDS: &[&str] = &["must", "required"];
const PAYMENT_KEYWORDS: &[&str] = &["cash", "loan", "finance"];
const USAGE_KEYWORDS: &[&str] = &["commute", "work", "family"];
const TIMING_KEYWORDS: &[&str] = &["week", "month", "day"];
const CONDITION_KEYWORDS: &[&str] = &["title", "clean"];

/// Profile fields echoed in the report header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    pub color: String,
    pub mileage: String,
    pub must_have_features: String,
    pub nice_to_have_features: String,
    pub payment_method: String,
    pub intended_use: String,
    pub purchase_date: String,
    pub special_considerations: String,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            color: NOT_SPECIFIED.to_string(),
            mileage: NOT_SPECIFIED.to_string(),
            must_have_features: NOT_SPECIFIED.to_string(),
            nice_to_have_features: NOT_SPECIFIED.to_string(),
            payment_method: NOT_SPECIFIED.to_string(),
            intended_use: NOT_SPECIFIED.to_string(),
            purchase_date: NOT_SPECIFIED.to_string(),
            special_considerations: NOT_SPECIFIED.to_string(),
        }
    }
}

impl CustomerProfile {
    /// Extract profile fields from a comma-separated requirements string.
    pub fn extract(requirements: &str) -> Self {
        let mut profile = Self::default();

        for part in requirements.split(',') {
            let part = part.trim().to_lowercase();

            if contains_any(&part, COLOR_KEYWORDS) {
                profile.color = value_after_colon(&part);
            } else if contains_any(&part, MILEAGE_KEYWORDS) {
                profile.mileage = value_after_colon(&part);
            } else if contains_any(&part, FEATURE_KEYWORDS) {
                if contains_any(&part, URGENCY_KEYWORDS) {
                    profile.must_have_features = part;
                } else {
                    profile.nice_to_have_features = part;
                }
            } else if contains_any(&part, PAYMENT_KEYWORDS) {
                profile.payment_method = part;
            } else if contains_any(&part, USAGE_KEYWORDS) {
                profile.intended_use = part;
            } else if contains_any(&part, TIMING_KEYWORDS) {
                profile.purchase_date = part;
            } else if contains_any(&part, CONDITION_KEYWORDS) {
                profile.special_considerations = part;
            }
        }

        profile
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// `"color: black"` -> `"black"`; parts without a colon are kept whole.
fn value_after_colon(part: &str) -> String {
    match part.rsplit(':').next() {
        Some(value) if part.contains(':') => value.trim().to_string(),
        _ => part.to_string(),
    }
}
