//! Chart-ready series for the dashboard.
//!
//! Reads the ledger as-is and reshapes it into one series per column, grouped
//! into panels by column name. Nothing is recomputed here; unbounded
//! estimates become `null` so charting code can leave a gap.

use serde::Serialize;

use crate::models::INFINITY_TOKEN;

use super::LedgerContents;

/// Panel title and the column-name prefixes it draws.
const PANELS: [(&str, &[&str]); 7] = [
    ("Requests by size", &["total_requests", "requests_"]),
    ("Churn", &["added_", "removed_", "total_added", "total_removed", "net_change"]),
    ("Flexibility", &["exact_requests", "flexible_requests", "avg_flexibility_degree", "range_changed"]),
    ("Time on waitlist", &["age_"]),
    ("Clearing rate per quarter", &["avg_"]),
    ("Estimated wait", &["estimated_"]),
    ("Data quality", &["skipped_records"]),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub column: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub panels: Vec<Panel>,
}

pub fn build_chart_data(ledger: &LedgerContents) -> ChartData {
    let column = |idx: usize| -> Vec<String> {
        ledger
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect()
    };

    let labels = ledger
        .header
        .iter()
        .position(|h| h == "timestamp")
        .map(|idx| column(idx))
        .unwrap_or_default();

    // "avg_" would also catch avg_flexibility_degree; first matching panel wins.
    let panel_of = |name: &str| {
        PANELS
            .iter()
            .position(|(_, prefixes)| prefixes.iter().any(|p| name.starts_with(p)))
    };

    let mut panels: Vec<Panel> = PANELS
        .iter()
        .map(|(title, _)| Panel {
            title: title.to_string(),
            series: Vec::new(),
        })
        .collect();

    for (idx, name) in ledger.header.iter().enumerate() {
        if let Some(panel) = panel_of(name) {
            panels[panel].series.push(Series {
                column: name.clone(),
                values: column(idx).iter().map(|v| parse_value(v)).collect(),
            });
        }
    }

    panels.retain(|panel| !panel.series.is_empty());

    ChartData { labels, panels }
}

fn parse_value(field: &str) -> Option<f64> {
    if field == INFINITY_TOKEN {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
