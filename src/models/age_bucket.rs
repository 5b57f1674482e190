use serde::Serialize;

/// Coarse bucket of how long a request has been waiting.
///
/// Each bucket excludes its lower edge and includes its upper edge, except
/// `UpTo3Months` (which also holds same-day and future-dated entries) and the
/// open-ended `Over24Months`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgeBucket {
    UpTo3Months,
    UpTo6Months,
    UpTo12Months,
    UpTo24Months,
    Over24Months,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::UpTo3Months,
        AgeBucket::UpTo6Months,
        AgeBucket::UpTo12Months,
        AgeBucket::UpTo24Months,
        AgeBucket::Over24Months,
    ];

    /// Inclusive upper edge in calendar months, `None` for the last bucket.
    pub fn upper_months(&self) -> Option<u32> {
        match self {
            AgeBucket::UpTo3Months => Some(3),
            AgeBucket::UpTo6Months => Some(6),
            AgeBucket::UpTo12Months => Some(12),
            AgeBucket::UpTo24Months => Some(24),
            AgeBucket::Over24Months => None,
        }
    }

    /// Suffix used in ledger column names.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            AgeBucket::UpTo3Months => "0_3m",
            AgeBucket::UpTo6Months => "3_6m",
            AgeBucket::UpTo12Months => "6_12m",
            AgeBucket::UpTo24Months => "12_24m",
            AgeBucket::Over24Months => "24m_plus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UpTo3Months => "0-3 months",
            AgeBucket::UpTo6Months => "3-6 months",
            AgeBucket::UpTo12Months => "6-12 months",
            AgeBucket::UpTo24Months => "12-24 months",
            AgeBucket::Over24Months => "24+ months",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}
