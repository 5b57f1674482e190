use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::BlockSize;
use crate::error::WaitlistError;

/// Calendar quarter label, ordered by year then quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8,
}

impl Quarter {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = WaitlistError;

    /// Accepts `2023Q1`, `2023-Q1` and `2023 Q1` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WaitlistError::InvalidPeriod {
            label: s.to_string(),
        };

        let upper = s.trim().to_ascii_uppercase();
        let (year, quarter) = upper.split_once('Q').ok_or_else(invalid)?;
        let year = year
            .trim_end_matches(['-', ' '])
            .parse::<i32>()
            .map_err(|_| invalid())?;
        let quarter = quarter.parse::<u8>().map_err(|_| invalid())?;

        Quarter::new(year, quarter).ok_or_else(invalid)
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quarter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Blocks of one size the registry reissued to waitlist requesters in a quarter.
///
/// Several records may share a (period, size) pair; they are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalClearingRecord {
    pub period: Quarter,
    #[serde(deserialize_with = "deserialize_size")]
    pub size: BlockSize,
    pub cleared: u64,
}

impl HistoricalClearingRecord {
    pub fn new(period: Quarter, size: BlockSize, cleared: u64) -> Self {
        Self {
            period,
            size,
            cleared,
        }
    }
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BlockSize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Prefix(u8),
        Text(String),
    }

    match Tag::deserialize(deserializer)? {
        Tag::Prefix(prefix) => BlockSize::from_prefix(prefix)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown prefix /{prefix}"))),
        Tag::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}
