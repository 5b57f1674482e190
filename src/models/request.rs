use chrono::NaiveDate;
use serde::Serialize;

use super::BlockSize;

/// One pending waitlist entry.
///
/// `min_size <= max_size` always holds; the parser drops records that
/// violate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub id: String,
    pub min_size: BlockSize,
    pub max_size: BlockSize,
    /// `None` when the registry's date could not be parsed.
    pub entered: Option<NaiveDate>,
}

impl Request {
    pub fn new(
        id: String,
        min_size: BlockSize,
        max_size: BlockSize,
        entered: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            min_size,
            max_size,
            entered,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.min_size == self.max_size
    }

    /// Number of size classes spanned between minimum and maximum.
    pub fn flexibility_degree(&self) -> u8 {
        self.min_size.step().abs_diff(self.max_size.step())
    }

    pub fn same_range(&self, other: &Request) -> bool {
        self.min_size == other.min_size && self.max_size == other.max_size
    }
}
