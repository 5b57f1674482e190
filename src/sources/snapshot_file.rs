//! Loading waitlist snapshots from JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    engine::{order_chronologically, parse_raw_snapshot, ParseResult, RawSnapshot},
    error::{Result, WaitlistError},
    models::Snapshot,
};

/// `2024-06-01`, optionally followed by a time as `T120000` or `_12-00-00`.
static FILE_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[T_](\d{2})[-:]?(\d{2})[-:]?(\d{2}))?")
        .expect("file stamp pattern is valid")
});

/// Read and parse one snapshot file.
///
/// The observation time comes from the document's envelope, then from
/// `fallback_timestamp`, then from a date embedded in the file name.
pub fn load_snapshot(path: &Path, fallback_timestamp: Option<DateTime<Utc>>) -> Result<ParseResult> {
    let source_name = path.display().to_string();
    let unreadable = |reason: String| WaitlistError::SnapshotUnreadable {
        source_name: source_name.clone(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let raw: RawSnapshot = serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))?;

    let fallback = fallback_timestamp.or_else(|| timestamp_from_file_name(path));

    parse_raw_snapshot(&raw, fallback, &source_name)
}

/// Load every `*.json` snapshot in `dir`, oldest first.
///
/// Any unreadable file fails the whole load.
pub fn load_snapshot_dir(dir: &Path) -> Result<Vec<Snapshot>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let snapshots = paths
        .iter()
        .map(|path| load_snapshot(path, None).map(|result| result.snapshot))
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} snapshots from {}", snapshots.len(), dir.display());

    Ok(order_chronologically(snapshots))
}

/// Observation time embedded in a file name, e.g. `waitlist-2024-06-01.json`.
pub fn timestamp_from_file_name(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_stem()?.to_str()?;
    let caps = FILE_STAMP.captures(stem)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, num(2)?, num(3)?)?;
    let time = match (num(4), num(5), num(6)) {
        (Some(h), Some(m), Some(s)) => NaiveTime::from_hms_opt(h, m, s)?,
        _ => NaiveTime::MIN,
    };

    Some(date.and_time(time).and_utc())
}
