use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{AgeBucket, PerSize};

/// Text written for an unbounded wait estimate.
pub const INFINITY_TOKEN: &str = "inf";

/// Ledger column names, in position order.
///
/// Positions are the schema: existing names are never renamed, reordered or
/// removed, new columns go at the end.
pub const COLUMNS: [&str; 44] = [
    "timestamp",
    "total_requests",
    "requests_22",
    "requests_23",
    "requests_24",
    "added_22",
    "added_23",
    "added_24",
    "removed_22",
    "removed_23",
    "removed_24",
    "total_added",
    "total_removed",
    "net_change",
    "exact_requests",
    "flexible_requests",
    "avg_flexibility_degree",
    "age_22_0_3m",
    "age_22_3_6m",
    "age_22_6_12m",
    "age_22_12_24m",
    "age_22_24m_plus",
    "age_23_0_3m",
    "age_23_3_6m",
    "age_23_6_12m",
    "age_23_12_24m",
    "age_23_24m_plus",
    "age_24_0_3m",
    "age_24_3_6m",
    "age_24_6_12m",
    "age_24_12_24m",
    "age_24_24m_plus",
    "avg_22_cleared_per_quarter",
    "avg_23_cleared_per_quarter",
    "avg_24_cleared_per_quarter",
    "estimated_years_22",
    "estimated_years_23",
    "estimated_years_24",
    // appended
    "estimated_quarters_22",
    "estimated_quarters_23",
    "estimated_quarters_24",
    "range_changed",
    "age_unknown",
    "skipped_records",
];

/// One fixed-schema ledger row summarizing a (snapshot, previous) pair.
///
/// Every metric has a concrete value. Missing inputs show up as zero, except
/// the wait estimates, which are `f64::INFINITY` when nothing has cleared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    pub timestamp: DateTime<Utc>,

    // Current state
    pub total_requests: u64,
    pub requests: PerSize<u64>,

    // Churn against the previous snapshot
    pub added: PerSize<u64>,
    pub removed: PerSize<u64>,
    pub total_added: u64,
    pub total_removed: u64,
    pub net_change: i64,

    // Flexibility
    pub exact_requests: u64,
    pub flexible_requests: u64,
    pub avg_flexibility_degree: f64,

    // Age distribution, per size then per bucket
    pub age: PerSize<[u64; 5]>,

    // Clearing history and projections
    pub avg_cleared_per_quarter: PerSize<f64>,
    pub estimated_years: PerSize<f64>,
    pub estimated_quarters: PerSize<f64>,

    // Secondary signals
    pub range_changed: u64,
    pub age_unknown: u64,
    pub skipped_records: u64,
}

impl DerivedRow {
    pub fn age_count(&self, size: super::BlockSize, bucket: AgeBucket) -> u64 {
        self.age.get(size)[bucket.index()]
    }

    /// Renders the row as ledger fields, one per entry of [`COLUMNS`].
    pub fn to_record(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(COLUMNS.len());

        fields.push(format_timestamp(&self.timestamp));
        fields.push(self.total_requests.to_string());
        fields.extend(self.requests.0.iter().map(u64::to_string));
        fields.extend(self.added.0.iter().map(u64::to_string));
        fields.extend(self.removed.0.iter().map(u64::to_string));
        fields.push(self.total_added.to_string());
        fields.push(self.total_removed.to_string());
        fields.push(self.net_change.to_string());
        fields.push(self.exact_requests.to_string());
        fields.push(self.flexible_requests.to_string());
        fields.push(format!("{:.2}", self.avg_flexibility_degree));
        for buckets in self.age.0.iter() {
            fields.extend(buckets.iter().map(u64::to_string));
        }
        fields.extend(self.avg_cleared_per_quarter.0.iter().map(|r| format!("{r:.1}")));
        fields.extend(self.estimated_years.0.iter().map(|y| format_estimate(*y, 1)));

        fields.extend(self.estimated_quarters.0.iter().map(|q| format_estimate(*q, 0)));
        fields.push(self.range_changed.to_string());
        fields.push(self.age_unknown.to_string());
        fields.push(self.skipped_records.to_string());

        fields
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Formats a projection, writing [`INFINITY_TOKEN`] for unbounded values.
pub fn format_estimate(value: f64, decimals: usize) -> String {
    if value.is_infinite() {
        INFINITY_TOKEN.to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_names_unique() {
        let unique: HashSet<_> = COLUMNS.iter().collect();
        assert_eq!(unique.len(), COLUMNS.len());
    }

    #[test]
    fn test_leading_columns_frozen() {
        // Column positions are part of the ledger format. Changing any of
        // these breaks every accumulated file.
        assert_eq!(COLUMNS[0], "timestamp");
        assert_eq!(COLUMNS[1], "total_requests");
        assert_eq!(COLUMNS[2..5], ["requests_22", "requests_23", "requests_24"]);
        assert_eq!(COLUMNS[11..14], ["total_added", "total_removed", "net_change"]);
        assert_eq!(COLUMNS[16], "avg_flexibility_degree");
        assert_eq!(COLUMNS[17], "age_22_0_3m");
        assert_eq!(COLUMNS[31], "age_24_24m_plus");
        assert_eq!(COLUMNS[32], "avg_22_cleared_per_quarter");
        assert_eq!(COLUMNS[37], "estimated_years_24");
    }

    #[test]
    fn test_age_columns_follow_bucket_order() {
        for (i, bucket) in AgeBucket::ALL.iter().enumerate() {
            assert!(COLUMNS[17 + i].ends_with(bucket.column_suffix()));
        }
    }

    #[test]
    fn test_format_estimate() {
        assert_eq!(format_estimate(2.5, 1), "2.5");
        assert_eq!(format_estimate(10.0, 0), "10");
        assert_eq!(format_estimate(f64::INFINITY, 1), "inf");
    }
}
