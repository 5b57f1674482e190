//! Extraction of waitlist rows from archived copies of the registry's public
//! waitlist page.
//!
//! The page renders the list as `<tbody id="wait_list">` with one row per
//! request: position, date added, maximum prefix, minimum prefix.

use std::fs;
use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    engine::RawRequest,
    error::{Result, WaitlistError},
    utils::parse_archive_datetime,
};

static WAIT_LIST_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<tbody id="wait_list"[^>]*>(.*?)</tbody>"#).expect("tbody pattern is valid")
});
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("row pattern is valid"));
static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("cell pattern is valid"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Pull raw waitlist records out of an archived page.
///
/// Rows with fewer than four cells, an unreadable date, or a size cell that
/// is not a `/NN` prefix are dropped.
pub fn extract_waitlist_rows(html: &str) -> Vec<RawRequest> {
    let Some(body) = WAIT_LIST_BODY.captures(html).and_then(|c| c.get(1)) else {
        warn!("No wait_list table body found");
        return Vec::new();
    };

    let mut dropped = 0usize;
    let rows: Vec<RawRequest> = ROW
        .captures_iter(body.as_str())
        .filter_map(|row| {
            let cells: Vec<String> = CELL
                .captures_iter(&row[1])
                .map(|cell| TAG.replace_all(&cell[1], "").trim().to_string())
                .collect();

            let parsed = parse_row(&cells);
            if parsed.is_none() && cells.len() >= 4 {
                dropped += 1;
            }
            parsed
        })
        .collect();

    if dropped > 0 {
        warn!("Dropped {} unreadable waitlist rows", dropped);
    }

    rows
}

fn parse_row(cells: &[String]) -> Option<RawRequest> {
    let [_position, date, max_prefix, min_prefix, ..] = cells else {
        return None;
    };

    let added = parse_archive_datetime(date)?;
    let max = slash_prefix(max_prefix)?;
    let min = slash_prefix(min_prefix)?;

    Some(RawRequest {
        id: None,
        action_date: Some(Value::String(added.to_rfc3339())),
        minimum_cidr: Some(Value::from(min)),
        maximum_cidr: Some(Value::from(max)),
    })
}

fn slash_prefix(cell: &str) -> Option<u8> {
    cell.strip_prefix('/')?.trim().parse().ok()
}

/// Read an archived page from disk and extract its rows.
pub fn extract_waitlist_file(path: &Path) -> Result<Vec<RawRequest>> {
    let source_name = path.display().to_string();
    let html = fs::read_to_string(path)?;
    let rows = extract_waitlist_rows(&html);

    if rows.is_empty() {
        return Err(WaitlistError::NothingExtracted { source_name });
    }

    info!("Extracted {} records from {}", rows.len(), source_name);
    Ok(rows)
}
