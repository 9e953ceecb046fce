//! Normalization of a recommendation-table fragment found in a transcript.

use super::sections::{REQUIRED_MARKERS, VEHICLE_TABLE_HEADER};

/// Manufacturers whose mention marks a line as a vehicle row.
const KNOWN_MAKES: &[&str] = &[
    "nissan",
    "toyota",
    "honda",
    "hyundai",
    "mazda",
    "subaru",
    "ford",
    "chevrolet",
    "volkswagen",
    "kia",
];

/// Maximum number of ranked rows.
pub const MAX_RANKED_ROWS: usize = 10;

/// Cells per vehicle row, excluding the rank.
const ROW_CELLS: usize = 6;

/// True when `raw` looks like it carries a top-N recommendation list.
pub fn has_recommendation_fragment(raw: &str) -> bool {
    raw.contains("Top") && raw.contains("Recommended")
}

/// Render the ranked table under `heading`.
///
/// Rows are the first [`MAX_RANKED_ROWS`] lines mentioning a known make.
/// Lines carrying a section marker stay out of the table, since the raw
/// transcript is echoed after it.
/// Lines with at least six pipe-delimited cells keep their first six
/// cells; shorter lines become the model cell with placeholder values.
pub fn render_ranked_table(raw: &str, heading: &str) -> String {
    let mut out = format!("{heading}\n{VEHICLE_TABLE_HEADER}");

    let rows = raw
        .lines()
        .filter(|line| mentions_known_make(line) && !carries_marker(line));
    for (idx, line) in rows.take(MAX_RANKED_ROWS).enumerate() {
        let rank = idx + 1;
        let cells: Vec<&str> = line
            .trim()
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .collect();

        if cells.len() >= ROW_CELLS {
            out.push_str(&format!("| {rank} | {} |\n", cells[..ROW_CELLS].join(" | ")));
        } else {
            out.push_str(&format!(
                "| {rank} | {} | $TBD | TBD | TBD | TBD | TBD |\n",
                line.trim()
            ));
        }
    }

    out.push('\n');
    out
}

fn mentions_known_make(line: &str) -> bool {
    let lower = line.to_lowercase();
    KNOWN_MAKES.iter().any(|make| lower.contains(make))
}

fn carries_marker(line: &str) -> bool {
    REQUIRED_MARKERS.iter().any(|marker| line.contains(marker))
}
