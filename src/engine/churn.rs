//! Churn between two snapshots.
//!
//! Attribution rule: an added request is counted under the size it has in the
//! current snapshot, a removed one under the size it had in the previous
//! snapshot. A request present in both is never churn, even when its size
//! range changed; that is reported separately as `range_changed`.
//!
//! Consequently the overall identity `net_change == |current| - |previous|`
//! always holds, while the per-size identity
//! `net[s] == count_current[s] - count_previous[s]` breaks for requests whose
//! counted (maximum) size changed between the two snapshots.

use crate::models::{BlockSize, PerSize, Snapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Churn {
    pub added: PerSize<u64>,
    pub removed: PerSize<u64>,
    /// Requests present in both snapshots whose size range differs.
    pub range_changed: u64,
}

impl Churn {
    pub fn total_added(&self) -> u64 {
        self.added.total()
    }

    pub fn total_removed(&self) -> u64 {
        self.removed.total()
    }

    pub fn net(&self, size: BlockSize) -> i64 {
        self.added.get(size) as i64 - self.removed.get(size) as i64
    }

    pub fn net_change(&self) -> i64 {
        BlockSize::ALL.iter().map(|size| self.net(*size)).sum()
    }
}

/// Compare `current` against `previous`.
///
/// Without a previous snapshot there is nothing to diff against and every
/// churn figure is zero.
pub fn diff(current: &Snapshot, previous: Option<&Snapshot>) -> Churn {
    let Some(previous) = previous else {
        return Churn::default();
    };

    let current_ids = current.by_id();
    let previous_ids = previous.by_id();

    let (added, range_changed) = current.requests().iter().fold(
        (PerSize::<u64>::default(), 0u64),
        |(mut added, changed), request| match previous_ids.get(request.id.as_str()) {
            None => {
                *added.get_mut(request.max_size) += 1;
                (added, changed)
            }
            Some(before) if !before.same_range(request) => (added, changed + 1),
            Some(_) => (added, changed),
        },
    );

    let removed = previous
        .requests()
        .iter()
        .filter(|request| !current_ids.contains_key(request.id.as_str()))
        .fold(PerSize::<u64>::default(), |mut removed, request| {
            *removed.get_mut(request.max_size) += 1;
            removed
        });

    Churn {
        added,
        removed,
        range_changed,
    }
}
