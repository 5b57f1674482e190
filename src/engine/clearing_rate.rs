//! Historical clearing-rate estimation.
//!
//! Cleared counts are summed per (size, quarter) and averaged per size over
//! the quarters that actually saw clearing for that size. Quarters without
//! any record for a size are left out of the denominator instead of counting
//! as zero, so gaps in the published history do not drag the rate down.

use std::collections::BTreeMap;

use log::debug;

use crate::models::{BlockSize, HistoricalClearingRecord, PerSize, Quarter};

/// Mean blocks cleared per quarter, per size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClearingRates {
    pub per_quarter: PerSize<f64>,
    /// Quarters contributing to each size's mean.
    pub quarters_observed: PerSize<u64>,
}

impl ClearingRates {
    pub fn estimate(records: &[HistoricalClearingRecord]) -> Self {
        let totals: BTreeMap<(BlockSize, Quarter), u64> =
            records.iter().fold(BTreeMap::new(), |mut totals, record| {
                *totals.entry((record.size, record.period)).or_insert(0) += record.cleared;
                totals
            });

        let (sums, quarters) = totals
            .iter()
            .filter(|(_, cleared)| **cleared > 0)
            .fold(
                (PerSize::<u64>::default(), PerSize::<u64>::default()),
                |(mut sums, mut quarters), ((size, _), cleared)| {
                    *sums.get_mut(*size) += cleared;
                    *quarters.get_mut(*size) += 1;
                    (sums, quarters)
                },
            );

        let per_quarter = PerSize::from_fn(|size| match quarters.get(size) {
            0 => 0.0,
            n => sums.get(size) as f64 / n as f64,
        });

        debug!(
            "Estimated clearing rates from {} records: {:?} over {:?} quarters",
            records.len(),
            per_quarter.0,
            quarters.0
        );

        Self {
            per_quarter,
            quarters_observed: quarters,
        }
    }

    /// Average per quarter; zero means no history for that size.
    pub fn rate(&self, size: BlockSize) -> f64 {
        self.per_quarter.get(size)
    }
}
