use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashMap;

use super::Request;

/// Immutable set of requests observed at one instant.
///
/// Built only through the parser, which guarantees unique identifiers.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    requests: Vec<Request>,
    /// Records the parser dropped while building this snapshot.
    pub skipped: usize,
}

impl Snapshot {
    pub(crate) fn new(timestamp: DateTime<Utc>, requests: Vec<Request>, skipped: usize) -> Self {
        Self {
            timestamp,
            requests,
            skipped,
        }
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Calendar date of the observation, used as the age reference point.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn by_id(&self) -> FxHashMap<&str, &Request> {
        self.requests.iter().map(|r| (r.id.as_str(), r)).collect()
    }
}
