//! Date parsing for the formats the registry has published over the years.
//!
//! The live API emits ISO 8601 timestamps, archived pages use a long
//! human-readable form (`Thu, 23 Jun 2022, 14:17:46 EDT`), and the
//! clearing history CSV uses US short dates (`6/23/22`).

use chrono::{
    DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Utc,
};

const EDT_OFFSET_SECS: i32 = 4 * 3600;
const EST_OFFSET_SECS: i32 = 5 * 3600;

/// Parse any supported timestamp form, keeping its original offset.
///
/// Offset-less inputs are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    if let Some(dt) = parse_archive_datetime(s) {
        return Some(dt);
    }

    parse_date(s).and_then(|date| date.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc().fixed_offset())
}

/// Parse a timestamp and normalize it to UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    parse_datetime(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date a request entered the waitlist, in the registry's own offset.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date_naive())
}

/// Parse a bare date: `2022-06-23`, `6/23/22` or `6/23/2022`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Parse the archived page form, e.g. `Thu, 23 Jun 2022, 14:17:46 EDT`.
///
/// The weekday is optional and `Sept` is accepted for September. A missing
/// zone is read as EDT.
pub fn parse_archive_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let mut s = raw.trim();

    if let Some((head, rest)) = s.split_once(',') {
        if !head.is_empty() && head.chars().all(|c| c.is_ascii_alphabetic()) {
            s = rest.trim_start();
        }
    }

    let (body, offset_secs) = if let Some(body) = s.strip_suffix(" EST") {
        (body, EST_OFFSET_SECS)
    } else if let Some(body) = s.strip_suffix(" EDT") {
        (body, EDT_OFFSET_SECS)
    } else {
        (s, EDT_OFFSET_SECS)
    };

    let body = body.replace("Sept", "Sep");
    let naive = NaiveDateTime::parse_from_str(&body, "%d %b %Y, %H:%M:%S").ok()?;

    FixedOffset::west_opt(offset_secs)?
        .from_local_datetime(&naive)
        .single()
}

/// The date `months` calendar months before `date`, clamped to month end.
pub fn months_before(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_variants() {
        assert_eq!(parse_entry_date("2022-06-23T14:17:46-04:00"), Some(ymd(2022, 6, 23)));
        assert_eq!(parse_entry_date("2022-06-23T14:17:46.000-0400"), Some(ymd(2022, 6, 23)));
        assert_eq!(parse_entry_date("2022-06-23T14:17:46"), Some(ymd(2022, 6, 23)));
        assert_eq!(parse_entry_date("2022-06-23"), Some(ymd(2022, 6, 23)));
    }

    #[test]
    fn test_entry_date_keeps_registry_offset() {
        // 23:30 Eastern is already the next day in UTC
        assert_eq!(parse_entry_date("2022-06-23T23:30:00-04:00"), Some(ymd(2022, 6, 23)));
        assert_eq!(
            parse_utc("2022-06-23T23:30:00-04:00").unwrap().date_naive(),
            ymd(2022, 6, 24)
        );
    }

    #[test]
    fn test_parse_archive_form() {
        let dt = parse_archive_datetime("Thu, 23 Jun 2022, 14:17:46 EDT").unwrap();
        assert_eq!(dt.to_rfc3339(), "2022-06-23T14:17:46-04:00");

        let dt = parse_archive_datetime("Mon, 5 Dec 2022, 09:01:02 EST").unwrap();
        assert_eq!(dt.to_rfc3339(), "2022-12-05T09:01:02-05:00");

        let dt = parse_archive_datetime("Fri, 2 Sept 2022, 10:00:00 EDT").unwrap();
        assert_eq!(dt.date_naive(), ymd(2022, 9, 2));
    }

    #[test]
    fn test_parse_short_us_dates() {
        assert_eq!(parse_date("6/23/22"), Some(ymd(2022, 6, 23)));
        assert_eq!(parse_date("12/01/2021"), Some(ymd(2021, 12, 1)));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_entry_date(""), None);
        assert_eq!(parse_entry_date("yesterday"), None);
        assert_eq!(parse_entry_date("2022-13-45"), None);
    }

    #[test]
    fn test_months_before_clamps() {
        assert_eq!(months_before(ymd(2024, 5, 31), 3), Some(ymd(2024, 2, 29)));
        assert_eq!(months_before(ymd(2024, 6, 15), 24), Some(ymd(2022, 6, 15)));
    }
}
