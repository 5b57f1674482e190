//! Per-request flexibility and age classification, and the reductions over it.
//!
//! Every aggregate here is a fold over immutable [`Annotation`]s, so results
//! do not depend on request order and re-running over the same snapshot gives
//! the same numbers.

use chrono::NaiveDate;

use crate::{
    models::{AgeBucket, BlockSize, PerSize, Request, Snapshot},
    utils::months_before,
};

/// Derived view of a single request at a given snapshot date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    /// Size the request is counted under (its maximum acceptable size).
    pub size: BlockSize,
    pub exact: bool,
    pub degree: u8,
    /// `None` when the entry date is unknown.
    pub age: Option<AgeBucket>,
}

pub fn annotate(request: &Request, reference: NaiveDate) -> Annotation {
    Annotation {
        size: request.max_size,
        exact: request.is_exact(),
        degree: request.flexibility_degree(),
        age: request.entered.map(|entered| classify_age(entered, reference)),
    }
}

pub fn annotate_snapshot(snapshot: &Snapshot) -> Vec<Annotation> {
    let reference = snapshot.date();
    snapshot
        .requests()
        .iter()
        .map(|request| annotate(request, reference))
        .collect()
}

/// Bucket the time between `entered` and `reference` in calendar months.
///
/// A request entered exactly N months before the reference belongs to the
/// bucket whose upper edge is N. Future entry dates count as brand new.
pub fn classify_age(entered: NaiveDate, reference: NaiveDate) -> AgeBucket {
    AgeBucket::ALL
        .into_iter()
        .find(|bucket| match bucket.upper_months() {
            Some(months) => months_before(reference, months).is_some_and(|edge| entered >= edge),
            None => true,
        })
        .unwrap_or(AgeBucket::Over24Months)
}

/// Exact/flexible split and mean flexibility degree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlexibilityStats {
    pub exact: u64,
    pub flexible: u64,
    pub degree_sum: u64,
}

impl FlexibilityStats {
    pub fn from_annotations<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Self {
        annotations
            .into_iter()
            .fold(Self::default(), |stats, a| Self {
                exact: stats.exact + a.exact as u64,
                flexible: stats.flexible + (!a.exact) as u64,
                degree_sum: stats.degree_sum + a.degree as u64,
            })
    }

    pub fn total(&self) -> u64 {
        self.exact + self.flexible
    }

    /// Mean degree across all requests, zero for an empty snapshot.
    pub fn average_degree(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.degree_sum as f64 / n as f64,
        }
    }
}

/// Request counts per size and age bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgeDistribution {
    pub counts: PerSize<[u64; 5]>,
    /// Requests with no usable entry date, excluded from `counts`.
    pub unknown: u64,
}

impl AgeDistribution {
    pub fn from_annotations<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Self {
        annotations
            .into_iter()
            .fold(Self::default(), |mut dist, a| {
                match a.age {
                    Some(bucket) => dist.counts.get_mut(a.size)[bucket.index()] += 1,
                    None => dist.unknown += 1,
                }
                dist
            })
    }

    pub fn total_known(&self) -> u64 {
        self.counts.0.iter().flatten().sum()
    }
}

pub fn size_counts<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> PerSize<u64> {
    annotations
        .into_iter()
        .fold(PerSize::<u64>::default(), |mut counts, a| {
            *counts.get_mut(a.size) += 1;
            counts
        })
}

/// Everything derivable from one snapshot on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotProfile {
    pub total: u64,
    pub counts: PerSize<u64>,
    pub flexibility: FlexibilityStats,
    pub ages: AgeDistribution,
}

impl SnapshotProfile {
    pub fn of(snapshot: &Snapshot) -> Self {
        let annotations = annotate_snapshot(snapshot);

        Self {
            total: annotations.len() as u64,
            counts: size_counts(&annotations),
            flexibility: FlexibilityStats::from_annotations(&annotations),
            ages: AgeDistribution::from_annotations(&annotations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse_records;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(min: BlockSize, max: BlockSize, entered: Option<NaiveDate>) -> Request {
        Request::new("r".to_string(), min, max, entered)
    }

    #[test]
    fn test_flexibility_degree() {
        let flexible = annotate(&request(BlockSize::Small, BlockSize::Large, None), ymd(2024, 1, 1));
        assert!(!flexible.exact);
        assert_eq!(flexible.degree, 2);

        let exact = annotate(&request(BlockSize::Medium, BlockSize::Medium, None), ymd(2024, 1, 1));
        assert!(exact.exact);
        assert_eq!(exact.degree, 0);
    }

    #[test]
    fn test_age_boundary_exactly_three_months() {
        let reference = ymd(2024, 6, 15);
        assert_eq!(classify_age(ymd(2024, 3, 15), reference), AgeBucket::UpTo3Months);
        assert_eq!(classify_age(ymd(2024, 3, 14), reference), AgeBucket::UpTo6Months);
    }

    #[test]
    fn test_age_bucket_edges() {
        let reference = ymd(2024, 6, 15);
        assert_eq!(classify_age(reference, reference), AgeBucket::UpTo3Months);
        assert_eq!(classify_age(ymd(2024, 7, 1), reference), AgeBucket::UpTo3Months);
        assert_eq!(classify_age(ymd(2023, 12, 15), reference), AgeBucket::UpTo6Months);
        assert_eq!(classify_age(ymd(2023, 12, 14), reference), AgeBucket::UpTo12Months);
        assert_eq!(classify_age(ymd(2023, 6, 15), reference), AgeBucket::UpTo12Months);
        assert_eq!(classify_age(ymd(2022, 6, 15), reference), AgeBucket::UpTo24Months);
        assert_eq!(classify_age(ymd(2022, 6, 14), reference), AgeBucket::Over24Months);
    }

    #[test]
    fn test_age_boundary_month_end() {
        // May 31 minus three months clamps to Feb 29
        let reference = ymd(2024, 5, 31);
        assert_eq!(classify_age(ymd(2024, 2, 29), reference), AgeBucket::UpTo3Months);
        assert_eq!(classify_age(ymd(2024, 2, 28), reference), AgeBucket::UpTo6Months);
    }

    #[test]
    fn test_profile_reductions() {
        let records = vec![
            json!({"waitListActionDate": "2024-05-01", "minimumCidr": 24, "maximumCidr": 22}),
            json!({"waitListActionDate": "2021-01-01", "minimumCidr": 22, "maximumCidr": 22}),
            json!({"waitListActionDate": "bogus", "minimumCidr": 24, "maximumCidr": 23}),
            json!({"waitListActionDate": "2024-01-01", "minimumCidr": 24, "maximumCidr": 24}),
        ];
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let snapshot = parse_records(&records, timestamp).snapshot;
        let profile = SnapshotProfile::of(&snapshot);

        assert_eq!(profile.total, 4);
        assert_eq!(profile.counts.0, [2, 1, 1]);
        assert_eq!(profile.counts.total(), profile.total);
        assert_eq!(profile.flexibility.exact, 2);
        assert_eq!(profile.flexibility.flexible, 2);
        assert!((profile.flexibility.average_degree() - 0.75).abs() < 1e-9);
        assert_eq!(profile.ages.unknown, 1);
        assert_eq!(profile.ages.total_known() + profile.ages.unknown, profile.total);
        assert_eq!(profile.ages.counts.get(BlockSize::Large)[AgeBucket::UpTo3Months.index()], 1);
        assert_eq!(profile.ages.counts.get(BlockSize::Large)[AgeBucket::Over24Months.index()], 1);
        assert_eq!(profile.ages.counts.get(BlockSize::Small)[AgeBucket::UpTo6Months.index()], 1);
    }

    #[test]
    fn test_profile_order_independent() {
        let mut records = vec![
            json!({"waitListActionDate": "2024-05-01", "minimumCidr": 24, "maximumCidr": 22}),
            json!({"waitListActionDate": "2022-01-01", "minimumCidr": 23, "maximumCidr": 23}),
            json!({"waitListActionDate": "2023-09-09", "minimumCidr": 24, "maximumCidr": 24}),
        ];
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let forward = SnapshotProfile::of(&parse_records(&records, timestamp).snapshot);

        records.reverse();
        let reversed_snapshot = parse_records(&records, timestamp).snapshot;
        let reversed = SnapshotProfile::of(&reversed_snapshot);

        assert_eq!(forward, reversed);
        assert_eq!(SnapshotProfile::of(&reversed_snapshot), reversed);
    }

    #[test]
    fn test_empty_snapshot_profile() {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let profile = SnapshotProfile::of(&parse_records(&[], timestamp).snapshot);

        assert_eq!(profile.total, 0);
        assert_eq!(profile.flexibility.average_degree(), 0.0);
    }
}
