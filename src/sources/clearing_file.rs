//! Loading the historical clearing cache.
//!
//! Two shapes are accepted: our own JSON cache of `{period, size, cleared}`
//! records, and the registry's published CSV listing each block reissued to
//! a waitlist requester (`CIDR Prefix`, `Date Reissued`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Result, WaitlistError},
    models::{BlockSize, HistoricalClearingRecord, Quarter},
    utils::{column_index, parse_date, split_records},
};

const PREFIX_COLUMN: &str = "CIDR Prefix";
const DATE_COLUMN: &str = "Date Reissued";

/// Load clearing records, picking the format from the file extension.
pub fn load_clearing_records(path: &Path) -> Result<Vec<HistoricalClearingRecord>> {
    let source_name = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| WaitlistError::ClearingCacheUnreadable {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        parse_registry_csv(&text, &source_name)?
    } else {
        parse_json_cache(&text, &source_name)?
    };

    info!("Loaded {} clearing records from {}", records.len(), source_name);
    Ok(records)
}

/// Decode our own JSON cache. The document must be an array; entries that do
/// not decode (unknown size, bad period label) are skipped.
pub fn parse_json_cache(text: &str, source_name: &str) -> Result<Vec<HistoricalClearingRecord>> {
    let entries: Vec<Value> =
        serde_json::from_str(text).map_err(|e| WaitlistError::ClearingCacheUnreadable {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;

    let total = entries.len();
    let records: Vec<HistoricalClearingRecord> = entries
        .iter()
        .filter_map(|entry| HistoricalClearingRecord::deserialize(entry).ok())
        .collect();

    if records.len() < total {
        warn!(
            "Skipped {} of {} entries in {} (unknown size or bad period)",
            total - records.len(),
            total,
            source_name
        );
    }

    Ok(records)
}

/// Convert the registry's one-row-per-block CSV into per-quarter records.
///
/// Rows for other prefix lengths or with unreadable dates are skipped.
pub fn parse_registry_csv(text: &str, source_name: &str) -> Result<Vec<HistoricalClearingRecord>> {
    let mut records = split_records(text).into_iter();

    let header = records.next().unwrap_or_default();
    let missing = |column: &str| WaitlistError::ClearingCacheUnreadable {
        source_name: source_name.to_string(),
        reason: format!("missing column {column:?}"),
    };
    let prefix_idx = column_index(&header, PREFIX_COLUMN).ok_or_else(|| missing(PREFIX_COLUMN))?;
    let date_idx = column_index(&header, DATE_COLUMN).ok_or_else(|| missing(DATE_COLUMN))?;

    let mut skipped = 0usize;
    let mut counts: BTreeMap<(Quarter, BlockSize), u64> = BTreeMap::new();

    for fields in records {
        let size = fields.get(prefix_idx).and_then(|cidr| prefix_size(cidr));
        let date = fields.get(date_idx).and_then(|date| parse_date(date));

        match (size, date) {
            (Some(size), Some(date)) => {
                *counts.entry((Quarter::from_date(date), size)).or_insert(0) += 1;
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} rows in {} (untracked prefix or bad date)", skipped, source_name);
    }

    Ok(counts
        .into_iter()
        .map(|((period, size), cleared)| HistoricalClearingRecord::new(period, size, cleared))
        .collect())
}

/// Block size of a CIDR like `23.150.0.0/24`.
fn prefix_size(cidr: &str) -> Option<BlockSize> {
    let (_, prefix) = cidr.trim().rsplit_once('/')?;
    BlockSize::from_prefix(prefix.trim().parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_CSV: &str = "\
Org Name, CIDR Prefix , Date Reissued
\"Example, Inc.\",23.150.0.0/24,1/15/23
Other LLC,23.151.0.0/24,3/30/23
Third Co,23.152.0.0/22,2/01/23
Fourth Co,23.153.0.0/24,4/02/23
Wide Co,23.154.0.0/20,4/02/23
Broken Co,23.155.0.0/24,not a date
";

    #[test]
    fn test_registry_csv_groups_by_quarter() {
        let records = parse_registry_csv(REGISTRY_CSV, "test").unwrap();
        let q1: Quarter = "2023Q1".parse().unwrap();
        let q2: Quarter = "2023Q2".parse().unwrap();

        assert_eq!(
            records,
            vec![
                HistoricalClearingRecord::new(q1, BlockSize::Small, 2),
                HistoricalClearingRecord::new(q1, BlockSize::Large, 1),
                HistoricalClearingRecord::new(q2, BlockSize::Small, 1),
            ]
        );
    }

    #[test]
    fn test_registry_csv_org_name_spanning_lines() {
        let text = "Org Name,CIDR Prefix,Date Reissued\n\"Example\nHoldings, LLC\",23.150.0.0/24,1/15/23\n";
        let records = parse_registry_csv(text, "test").unwrap();

        assert_eq!(
            records,
            vec![HistoricalClearingRecord::new("2023Q1".parse().unwrap(), BlockSize::Small, 1)]
        );
    }

    #[test]
    fn test_registry_csv_requires_columns() {
        let err = parse_registry_csv("Org Name,Date\nx,1/1/23\n", "test").unwrap_err();
        assert!(matches!(err, WaitlistError::ClearingCacheUnreadable { .. }));
    }

    #[test]
    fn test_load_json_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clearing.json");
        fs::write(&path, r#"[{"period": "2023Q4", "size": "/23", "cleared": 12}]"#).unwrap();

        let records = load_clearing_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size, BlockSize::Medium);
        assert_eq!(records[0].cleared, 12);
    }

    #[test]
    fn test_json_cache_skips_bad_entries() {
        let text = r#"[
            {"period": "2023Q1", "size": 24, "cleared": 10},
            {"period": "2023Q2", "size": 21, "cleared": 3},
            {"period": "2023Q5", "size": 24, "cleared": 4},
            {"period": "2023Q3", "size": "/22", "cleared": 1}
        ]"#;
        let records = parse_json_cache(text, "test").unwrap();

        assert_eq!(
            records,
            vec![
                HistoricalClearingRecord::new("2023Q1".parse().unwrap(), BlockSize::Small, 10),
                HistoricalClearingRecord::new("2023Q3".parse().unwrap(), BlockSize::Large, 1),
            ]
        );
    }

    #[test]
    fn test_json_cache_must_be_an_array() {
        let err = parse_json_cache(r#"{"period": "2023Q1"}"#, "test").unwrap_err();
        assert!(matches!(err, WaitlistError::ClearingCacheUnreadable { .. }));
    }
}
