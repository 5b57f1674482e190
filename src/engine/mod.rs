//! Snapshot-differencing and metrics derivation.
//!
//! - [`parser`] - raw records to a validated [`Snapshot`]
//! - [`classifier`] - per-request flexibility and age, and their reductions
//! - [`churn`] - added/removed requests between two snapshots
//! - [`clearing_rate`] - average blocks cleared per quarter
//! - [`projection`] - years to clear the backlog
//! - [`replay`] - rebuild the full time series
//!
//! [`derive_row`] ties them together into one ledger row.

pub mod churn;
pub mod classifier;
pub mod clearing_rate;
pub mod parser;
pub mod projection;
pub mod replay;

pub use churn::{diff, Churn};
pub use classifier::{AgeDistribution, FlexibilityStats, SnapshotProfile};
pub use clearing_rate::ClearingRates;
pub use parser::{parse_raw_snapshot, parse_records, ParseResult, RawRequest, RawSnapshot, SkipCounts};
pub use projection::{project, Projection};
pub use replay::{order_chronologically, replay};

use crate::models::{DerivedRow, Snapshot};

/// Derive the ledger row for `current`, diffed against `previous` when given.
///
/// Pure: the same inputs always produce the same row.
pub fn derive_row(
    current: &Snapshot,
    previous: Option<&Snapshot>,
    rates: &ClearingRates,
) -> DerivedRow {
    let profile = SnapshotProfile::of(current);
    let churn = diff(current, previous);
    let projection = project(&profile.counts, rates);

    DerivedRow {
        timestamp: current.timestamp,
        total_requests: profile.total,
        requests: profile.counts,
        added: churn.added,
        removed: churn.removed,
        total_added: churn.total_added(),
        total_removed: churn.total_removed(),
        net_change: churn.net_change(),
        exact_requests: profile.flexibility.exact,
        flexible_requests: profile.flexibility.flexible,
        avg_flexibility_degree: profile.flexibility.average_degree(),
        age: profile.ages.counts,
        avg_cleared_per_quarter: rates.per_quarter,
        estimated_years: projection.years,
        estimated_quarters: projection.quarters,
        range_changed: churn.range_changed,
        age_unknown: profile.ages.unknown,
        skipped_records: current.skipped as u64,
    }
}
