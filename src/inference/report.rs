//! Plain-text summary tables.

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::InfluenceSummary;

/// Render one row per named estimator with its standard error and interval.
#[must_use]
pub fn render_influence_table<S: AsRef<str>>(rows: &[(S, InfluenceSummary)]) -> String {
    let mut table = make_table(&["estimator", "estimate", "se", "level", "lower", "upper"]);
    for (name, summary) in rows {
        table.add_row(vec![
            Cell::new(name.as_ref()),
            Cell::new(format!("{:.4}", summary.estimate)),
            Cell::new(format!("{:.4}", summary.standard_error)),
            Cell::new(format!("{:.2}", summary.level)),
            Cell::new(format!("{:.4}", summary.interval.lower)),
            Cell::new(format!("{:.4}", summary.interval.upper)),
        ]);
    }
    table.to_string()
}

fn make_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}
