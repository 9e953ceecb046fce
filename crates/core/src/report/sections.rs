//! Required report sections and their canonical boilerplate.
//!
//! Presence is tested by case-sensitive substring match on the section
//! marker. Boilerplate bodies must not contain any other section's marker.

/// Heading of the ranked vehicle table.
pub const MARKER_TOP_VEHICLES: &str = "Top 10 Recommended Vehicles";
pub const MARKER_DETAILED_REASONS: &str = "Detailed Reasons";
pub const MARKER_REGISTRATION: &str = "Out-of-State Registration";
pub const MARKER_NEGOTIATION: &str = "Negotiation Strategies";
pub const MARKER_INSPECTION: &str = "Inspection Checklists";
pub const MARKER_FINAL: &str = "Final Recommendations";

/// Every marker a finished report must contain, in report order.
pub const REQUIRED_MARKERS: [&str; 6] = [
    MARKER_TOP_VEHICLES,
    MARKER_DETAILED_REASONS,
    MARKER_REGISTRATION,
    MARKER_NEGOTIATION,
    MARKER_INSPECTION,
    MARKER_FINAL,
];

/// Column header shared by the normalized and the placeholder vehicle table.
pub(crate) const VEHICLE_TABLE_HEADER: &str = "| Rank | Vehicle Model | Price | Mileage | Location | Seller Type | Link |\n\
|------|---------------|-------|---------|----------|-------------|------|\n";

/// Placeholder vehicle table for transcripts without recommendations.
pub(crate) fn top_vehicles(car_type: &str, budget_range: &str) -> String {
    format!(
        "\n\n{MARKER_TOP_VEHICLES}\n\
         {VEHICLE_TABLE_HEADER}\
         | 1 | [Vehicle] | $TBD | TBD | TBD | TBD | TBD |\n\
         \n\
         No specific listings were identified for a {car_type} within {budget_range}. \
         Check local dealer and private-party listings for current inventory.\n"
    )
}

pub(crate) fn detailed_reasons() -> String {
    format!(
        "\n\n{MARKER_DETAILED_REASONS} to Buy Each Vehicle\n\
         Detailed analysis of each recommended vehicle will be provided based on the research.\n"
    )
}

pub(crate) fn registration(state: &str) -> String {
    format!(
        "\n\n{MARKER_REGISTRATION} Requirements\n\
         For vehicles purchased outside {state}, the following requirements must be met:\n\
         Documentation: Bill of sale, title transfer documentation, and any loan agreements if applicable.\n\
         Fees: Expect to pay registration fees and sales tax based on the purchase price.\n\
         Inspection: Some vehicles may require a smog check before registration.\n\
         Timeline: Registration should occur within 10 days of purchase to avoid penalties.\n\
         Process: Visit the {state} DMV website for step-by-step instructions.\n"
    )
}

pub(crate) fn negotiation() -> String {
    format!(
        "\n\n{MARKER_NEGOTIATION}\n\
         | Vehicle Model | Negotiation Range | Suggested Offer Price |\n\
         |---------------|-------------------|-----------------------|\n\
         | [Vehicle] | [Range] | [Suggested Price] |\n\
         \n\
         Tips for Negotiation:\n\
         Research market values and be prepared to justify your offer.\n\
         Highlight any issues found during inspections as leverage.\n\
         Be ready to walk away if the deal doesn't meet your budget.\n"
    )
}

pub(crate) fn inspection() -> String {
    format!(
        "\n\n{MARKER_INSPECTION}\n\
         Exterior Inspection\n\
         Body condition (dents, scratches)\n\
         Paint consistency\n\
         Tire tread and wear\n\
         Functional lights and signals\n\
         \n\
         Interior Inspection\n\
         Seat condition\n\
         Dashboard functionality\n\
         Air conditioning and heating\n\
         Infotainment system operation\n\
         \n\
         Engine and Mechanical Components\n\
         Fluid levels\n\
         Signs of leaks\n\
         Battery condition\n\
         Brake responsiveness\n"
    )
}

pub(crate) fn final_recommendations() -> String {
    format!(
        "\n\n{MARKER_FINAL}\n\
         Next Steps:\n\
         Research and contact sellers for preferred vehicles.\n\
         Schedule inspections and test drives.\n\
         Prepare negotiation strategies based on research.\n\
         Complete necessary paperwork for out-of-state registration if applicable.\n\
         Finalize purchase before the desired purchase date.\n\
         \n\
         By following this structured approach, you can confidently navigate the car buying \
         process and select a vehicle that meets your needs and budget.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies() -> Vec<(&'static str, String)> {
        vec![
            (MARKER_TOP_VEHICLES, top_vehicles("SUV", "$30k")),
            (MARKER_DETAILED_REASONS, detailed_reasons()),
            (MARKER_REGISTRATION, registration("Ohio")),
            (MARKER_NEGOTIATION, negotiation()),
            (MARKER_INSPECTION, inspection()),
            (MARKER_FINAL, final_recommendations()),
        ]
    }

    #[test]
    fn each_body_contains_only_its_own_marker() {
        for (own, body) in bodies() {
            for marker in REQUIRED_MARKERS {
                let expected = usize::from(marker == own);
                assert_eq!(
                    body.matches(marker).count(),
                    expected,
                    "section {own:?} mentions {marker:?}"
                );
            }
        }
    }

    #[test]
    fn registration_names_the_state() {
        let body = registration("Oregon");
        assert!(body.contains("purchased outside Oregon"));
        assert!(body.contains("Visit the Oregon DMV website"));
    }
}
