//! Wait-time projection.
//!
//! Plain backlog over throughput. Cross-size substitution (splitting a /22 to
//! serve /24 requests) is not modeled.

use crate::models::{BlockSize, PerSize};

use super::ClearingRates;

const QUARTERS_PER_YEAR: f64 = 4.0;

/// Years until the current backlog clears at the historical rate.
///
/// Infinite when nothing has cleared for that size; consumers must handle it.
pub fn years_to_clear(backlog: u64, rate_per_quarter: f64) -> f64 {
    if rate_per_quarter > 0.0 {
        backlog as f64 / (rate_per_quarter * QUARTERS_PER_YEAR)
    } else {
        f64::INFINITY
    }
}

/// Whole quarters until the backlog clears, rounding a partial quarter up.
pub fn quarters_to_clear(backlog: u64, rate_per_quarter: f64) -> f64 {
    if rate_per_quarter > 0.0 {
        (backlog as f64 / rate_per_quarter).ceil()
    } else {
        f64::INFINITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub years: PerSize<f64>,
    pub quarters: PerSize<f64>,
}

pub fn project(backlog: &PerSize<u64>, rates: &ClearingRates) -> Projection {
    let for_size = |f: fn(u64, f64) -> f64| {
        PerSize::from_fn(|size: BlockSize| f(backlog.get(size), rates.rate(size)))
    };

    Projection {
        years: for_size(years_to_clear),
        quarters: for_size(quarters_to_clear),
    }
}
