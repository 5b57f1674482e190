//! Full history replay.
//!
//! Rebuilds the whole ledger from an ordered sequence of snapshots, feeding
//! each snapshot its predecessor as "previous". Replay is all-or-nothing: any
//! failure yields no rows at all.

use log::info;

use crate::{
    error::{Result, WaitlistError},
    models::{format_timestamp, DerivedRow, Snapshot},
};

use super::{derive_row, ClearingRates};

/// Derive one row per snapshot, oldest first.
///
/// Snapshots must already be in chronological order; a snapshot older than
/// its predecessor aborts the replay. Equal timestamps are accepted in the
/// given order.
pub fn replay(snapshots: &[Snapshot], rates: &ClearingRates) -> Result<Vec<DerivedRow>> {
    if snapshots.is_empty() {
        return Err(WaitlistError::EmptyReplay);
    }

    if let Some(pair) = snapshots.windows(2).find(|pair| pair[1].timestamp < pair[0].timestamp) {
        return Err(WaitlistError::OutOfOrder {
            previous: format_timestamp(&pair[0].timestamp),
            current: format_timestamp(&pair[1].timestamp),
        });
    }

    let start = std::time::Instant::now();

    let rows: Vec<DerivedRow> = snapshots
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let previous = i.checked_sub(1).map(|p| &snapshots[p]);
            derive_row(current, previous, rates)
        })
        .collect();

    info!(
        "Replayed {} snapshots ({} .. {}) in {:?}",
        rows.len(),
        format_timestamp(&snapshots[0].timestamp),
        format_timestamp(&snapshots[snapshots.len() - 1].timestamp),
        start.elapsed()
    );

    Ok(rows)
}

/// Sort snapshots oldest first, keeping input order for equal timestamps.
pub fn order_chronologically(mut snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
    snapshots.sort_by_key(|snapshot| snapshot.timestamp);
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse_records;
    use crate::models::BlockSize;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn snapshot(day: u32, ids: &[&str]) -> Snapshot {
        let records: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": id, "waitListActionDate": "2024-01-01", "minimumCidr": 24, "maximumCidr": 24}))
            .collect();
        let timestamp = Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap();
        parse_records(&records, timestamp).snapshot
    }

    #[test]
    fn test_empty_replay_fails() {
        let err = replay(&[], &ClearingRates::default()).unwrap_err();
        assert!(matches!(err, WaitlistError::EmptyReplay));
    }

    #[test]
    fn test_threads_previous_forward() {
        let snapshots = vec![
            snapshot(1, &["a", "b"]),
            snapshot(2, &["b", "c", "d"]),
            snapshot(3, &["d"]),
        ];
        let rows = replay(&snapshots, &ClearingRates::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].total_added, 0);
        assert_eq!(rows[0].total_removed, 0);
        assert_eq!(rows[0].total_requests, 2);
        assert_eq!(rows[1].added.get(BlockSize::Small), 2);
        assert_eq!(rows[1].removed.get(BlockSize::Small), 1);
        assert_eq!(rows[2].net_change, -2);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let snapshots = vec![snapshot(2, &["a"]), snapshot(1, &["a"])];
        let err = replay(&snapshots, &ClearingRates::default()).unwrap_err();

        assert!(matches!(err, WaitlistError::OutOfOrder { .. }));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let snapshots = vec![snapshot(1, &["a", "b"]), snapshot(2, &["b", "c"])];
        let first = replay(&snapshots, &ClearingRates::default()).unwrap();
        let second = replay(&snapshots, &ClearingRates::default()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_order_chronologically() {
        let ordered = order_chronologically(vec![snapshot(3, &[]), snapshot(1, &[]), snapshot(2, &[])]);
        let days: Vec<_> = ordered.iter().map(|s| s.timestamp.format("%d").to_string()).collect();

        assert_eq!(days, vec!["01", "02", "03"]);
    }
}
