//! Snapshot parsing.
//!
//! Normalizes raw waitlist records into a [`Snapshot`]. Bad records are
//! dropped and counted, never fatal: one malformed entry must not cost us a
//! whole data point.

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Result, WaitlistError},
    models::{BlockSize, Request, Snapshot},
    utils::{parse_entry_date, parse_utc},
};

/// One waitlist record as published. Field types are left loose because the
/// API emits numbers where archived extracts emit strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRequest {
    #[serde(default, alias = "identifier", alias = "requestId", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, rename = "waitListActionDate", alias = "waitlistactiondate")]
    pub action_date: Option<Value>,
    #[serde(default, rename = "minimumCidr", alias = "minimumcidr")]
    pub minimum_cidr: Option<Value>,
    #[serde(default, rename = "maximumCidr", alias = "maximumcidr")]
    pub maximum_cidr: Option<Value>,
}

/// Top-level snapshot document: either a bare record array or an envelope
/// carrying the observation time.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawSnapshot {
    Envelope {
        #[serde(default)]
        timestamp: Option<String>,
        requests: Vec<Value>,
    },
    Bare(Vec<Value>),
}

impl RawSnapshot {
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            RawSnapshot::Envelope { timestamp, .. } => timestamp.as_deref(),
            RawSnapshot::Bare(_) => None,
        }
    }

    pub fn records(&self) -> &[Value] {
        match self {
            RawSnapshot::Envelope { requests, .. } => requests,
            RawSnapshot::Bare(records) => records,
        }
    }
}

/// Why records were dropped while parsing one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// Entry was not a JSON object.
    pub malformed: usize,
    /// Size missing, outside /22../24, or not a prefix at all.
    pub bad_size: usize,
    /// Minimum size larger than maximum size.
    pub inverted_range: usize,
    /// Explicit identifier already seen in this snapshot.
    pub duplicate_id: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.malformed + self.bad_size + self.inverted_range + self.duplicate_id
    }
}

#[derive(Debug)]
pub struct ParseResult {
    pub snapshot: Snapshot,
    pub skipped: SkipCounts,
    /// Requests kept with an unknown entry date.
    pub undated: usize,
}

/// Parse a raw snapshot document.
///
/// The envelope's own timestamp wins over `fallback_timestamp`. Without
/// either, the snapshot cannot be placed in time and is rejected.
pub fn parse_raw_snapshot(
    raw: &RawSnapshot,
    fallback_timestamp: Option<DateTime<Utc>>,
    source_name: &str,
) -> Result<ParseResult> {
    let timestamp = match raw.timestamp() {
        Some(text) => parse_utc(text).ok_or_else(|| WaitlistError::SnapshotUnreadable {
            source_name: source_name.to_string(),
            reason: format!("unparseable snapshot timestamp {text:?}"),
        })?,
        None => fallback_timestamp.ok_or_else(|| WaitlistError::SnapshotUnreadable {
            source_name: source_name.to_string(),
            reason: "no observation timestamp".to_string(),
        })?,
    };

    let result = parse_records(raw.records(), timestamp);

    if result.skipped.total() > 0 {
        warn!(
            "Skipped {} of {} records in {} ({:?})",
            result.skipped.total(),
            raw.records().len(),
            source_name,
            result.skipped
        );
    }
    debug!(
        "Parsed {} requests from {} ({} with unknown entry date)",
        result.snapshot.len(),
        source_name,
        result.undated
    );

    Ok(result)
}

/// Build a snapshot from raw JSON records observed at `timestamp`.
pub fn parse_records(records: &[Value], timestamp: DateTime<Utc>) -> ParseResult {
    let mut skipped = SkipCounts::default();
    let mut undated = 0;
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut synthesized: FxHashMap<String, usize> = FxHashMap::default();
    let mut requests = Vec::with_capacity(records.len());

    for value in records {
        let raw = match RawRequest::deserialize(value) {
            Ok(raw) if value.is_object() => raw,
            _ => {
                skipped.malformed += 1;
                continue;
            }
        };

        let (min_size, max_size) = match resolve_range(&raw) {
            Ok(range) => range,
            Err(reason) => {
                match reason {
                    RangeError::BadSize => skipped.bad_size += 1,
                    RangeError::Inverted => skipped.inverted_range += 1,
                }
                continue;
            }
        };

        let date_text = raw.action_date.as_ref().and_then(value_text);

        let id = match raw.id.as_ref().and_then(value_text) {
            Some(explicit) => {
                if seen.contains(&explicit) {
                    skipped.duplicate_id += 1;
                    continue;
                }
                explicit
            }
            None => synthesize_id(date_text.as_deref(), &seen, &mut synthesized),
        };

        let entered = date_text.as_deref().and_then(parse_entry_date);
        if entered.is_none() {
            undated += 1;
        }

        seen.insert(id.clone());
        requests.push(Request::new(id, min_size, max_size, entered));
    }

    let snapshot = Snapshot::new(timestamp, requests, skipped.total());

    ParseResult {
        snapshot,
        skipped,
        undated,
    }
}

enum RangeError {
    BadSize,
    Inverted,
}

fn resolve_range(raw: &RawRequest) -> std::result::Result<(BlockSize, BlockSize), RangeError> {
    let min = raw.minimum_cidr.as_ref().filter(|v| !v.is_null());
    let max = raw.maximum_cidr.as_ref().filter(|v| !v.is_null());

    let (min, max) = match (min, max) {
        (None, None) => return Err(RangeError::BadSize),
        (Some(min), Some(max)) => (resolve_size(min), resolve_size(max)),
        // A lone bound describes an exact request
        (Some(only), None) | (None, Some(only)) => {
            let size = resolve_size(only);
            (size, size)
        }
    };

    match (min, max) {
        (Some(min), Some(max)) if min <= max => Ok((min, max)),
        (Some(_), Some(_)) => Err(RangeError::Inverted),
        _ => Err(RangeError::BadSize),
    }
}

fn resolve_size(value: &Value) -> Option<BlockSize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|p| u8::try_from(p).ok())
            .and_then(BlockSize::from_prefix),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identity key for an entry time: the instant in UTC when it parses, so the
/// same request keeps its id however the source spelled the timestamp.
fn entry_time_key(date_text: &str) -> String {
    parse_utc(date_text)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| date_text.to_string())
}

/// Records without a registry identifier are keyed by their entry time.
/// Requests sharing an entry time get an occurrence suffix in input order.
fn synthesize_id(
    date_text: Option<&str>,
    seen: &FxHashSet<String>,
    occurrences: &mut FxHashMap<String, usize>,
) -> String {
    let key = date_text.map_or_else(|| "undated".to_string(), entry_time_key);
    let count = occurrences.entry(key.clone()).or_insert(0);

    loop {
        *count += 1;
        let candidate = if *count == 1 {
            key.clone()
        } else {
            format!("{key}#{count}")
        };
        if !seen.contains(&candidate) {
            return candidate;
        }
    }
}
