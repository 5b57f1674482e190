use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaitlistError;

/// One of the three allocation sizes the waitlist hands out.
///
/// Ordering follows address count, so `Small < Medium < Large`. A request's
/// minimum size is therefore always `<=` its maximum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSize {
    Small,
    Medium,
    Large,
}

impl BlockSize {
    /// Column order used everywhere a per-size group is emitted (/22, /23, /24).
    pub const ALL: [BlockSize; 3] = [BlockSize::Large, BlockSize::Medium, BlockSize::Small];

    pub fn from_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            22 => Some(BlockSize::Large),
            23 => Some(BlockSize::Medium),
            24 => Some(BlockSize::Small),
            _ => None,
        }
    }

    pub fn prefix(&self) -> u8 {
        match self {
            BlockSize::Large => 22,
            BlockSize::Medium => 23,
            BlockSize::Small => 24,
        }
    }

    pub fn address_count(&self) -> u32 {
        match self {
            BlockSize::Large => 1024,
            BlockSize::Medium => 512,
            BlockSize::Small => 256,
        }
    }

    /// Weight in units of the smallest block, following the binary split ratio.
    pub fn large_equivalent(&self) -> u32 {
        match self {
            BlockSize::Large => 4,
            BlockSize::Medium => 2,
            BlockSize::Small => 1,
        }
    }

    /// Position in the size ladder, largest first. The difference between two
    /// steps is the number of size classes a flexible request spans.
    pub fn step(&self) -> u8 {
        self.prefix() - 22
    }

    /// Index into per-size arrays, matching [`BlockSize::ALL`].
    pub fn index(&self) -> usize {
        self.step() as usize
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.prefix())
    }
}

impl FromStr for BlockSize {
    type Err = WaitlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let by_name = match tag.to_ascii_lowercase().as_str() {
            "large" => Some(BlockSize::Large),
            "medium" => Some(BlockSize::Medium),
            "small" => Some(BlockSize::Small),
            _ => None,
        };

        by_name
            .or_else(|| {
                tag.trim_start_matches('/')
                    .parse::<u8>()
                    .ok()
                    .and_then(BlockSize::from_prefix)
            })
            .ok_or_else(|| WaitlistError::UnknownBlockSize {
                tag: tag.to_string(),
            })
    }
}

/// Fixed-size per-block-size container, indexed by [`BlockSize::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerSize<T>(pub [T; 3]);

impl<T: Copy> PerSize<T> {
    pub fn get(&self, size: BlockSize) -> T {
        self.0[size.index()]
    }

    pub fn from_fn(f: impl Fn(BlockSize) -> T) -> Self {
        PerSize(BlockSize::ALL.map(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockSize, T)> + '_ {
        BlockSize::ALL.iter().map(move |size| (*size, self.get(*size)))
    }
}

impl<T> PerSize<T> {
    pub fn get_mut(&mut self, size: BlockSize) -> &mut T {
        &mut self.0[size.index()]
    }
}

impl PerSize<u64> {
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tables() {
        assert_eq!(BlockSize::Large.address_count(), 1024);
        assert_eq!(BlockSize::Medium.address_count(), 512);
        assert_eq!(BlockSize::Small.address_count(), 256);

        for size in BlockSize::ALL {
            assert_eq!(
                size.address_count(),
                size.large_equivalent() * BlockSize::Small.address_count()
            );
        }
    }

    #[test]
    fn test_ordering_by_address_count() {
        assert!(BlockSize::Small < BlockSize::Medium);
        assert!(BlockSize::Medium < BlockSize::Large);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("/22".parse::<BlockSize>().unwrap(), BlockSize::Large);
        assert_eq!("23".parse::<BlockSize>().unwrap(), BlockSize::Medium);
        assert_eq!(" small ".parse::<BlockSize>().unwrap(), BlockSize::Small);
        assert!(matches!(
            "/21".parse::<BlockSize>(),
            Err(WaitlistError::UnknownBlockSize { .. })
        ));
    }

    #[test]
    fn test_per_size_indexing_follows_column_order() {
        let counts = PerSize::from_fn(|size| size.prefix() as u64);
        assert_eq!(counts.0, [22, 23, 24]);
        assert_eq!(counts.get(BlockSize::Small), 24);
        assert_eq!(counts.total(), 69);
    }
}
