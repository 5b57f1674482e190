use std::fs;

use serde_json::json;
use waitlist::{
    derive_row,
    engine::ClearingRates,
    models::{BlockSize, INFINITY_TOKEN},
    output::{build_chart_data, Ledger},
    sources::{extract_waitlist_rows, load_clearing_records, load_snapshot},
    WaitlistError,
};

const REGISTRY_CSV: &str = "\
Org Name,CIDR Prefix,Date Reissued
A,23.150.0.0/24,1/10/23
B,23.150.1.0/24,2/10/23
C,23.150.2.0/24,5/10/23
D,23.150.3.0/24,5/11/23
E,23.150.4.0/24,5/12/23
F,23.150.5.0/24,6/01/23
";

#[test]
fn test_derive_from_files_and_append() {
    let dir = tempfile::tempdir().unwrap();

    let requests: Vec<_> = (0..12)
        .map(|i| json!({"id": i, "waitListActionDate": "2023-09-01", "minimumCidr": 24, "maximumCidr": 24}))
        .chain((0..3).map(|i| json!({"id": 100 + i, "waitListActionDate": "2023-09-01", "minimumCidr": 23, "maximumCidr": 23})))
        .collect();
    let current_path = dir.path().join("waitlist-2024-06-01.json");
    fs::write(&current_path, serde_json::to_string(&requests).unwrap()).unwrap();

    let clearing_path = dir.path().join("reissued.csv");
    fs::write(&clearing_path, REGISTRY_CSV).unwrap();

    // No envelope, so the time comes from the file name.
    let current = load_snapshot(&current_path, None).unwrap().snapshot;
    let rates = ClearingRates::estimate(&load_clearing_records(&clearing_path).unwrap());

    // 2 blocks in 2023Q1, 4 in 2023Q2.
    assert_eq!(rates.rate(BlockSize::Small), 3.0);

    let row = derive_row(&current, None, &rates);
    assert_eq!(row.total_requests, 15);
    assert_eq!(row.total_requests, row.requests.total());
    assert_eq!(row.estimated_years.get(BlockSize::Small), 1.0);
    assert_eq!(row.estimated_quarters.get(BlockSize::Small), 4.0);
    assert!(row.estimated_years.get(BlockSize::Medium).is_infinite());

    let ledger = Ledger::new(dir.path().join("waitlist.csv"));
    ledger.append(&row).unwrap();

    let contents = ledger.read().unwrap();
    let years_23 = contents.header.iter().position(|h| h == "estimated_years_23").unwrap();
    assert_eq!(contents.rows[0][0], "2024-06-01T00:00:00Z");
    assert_eq!(contents.rows[0][years_23], INFINITY_TOKEN);

    let chart = build_chart_data(&contents);
    assert_eq!(chart.labels, vec!["2024-06-01T00:00:00Z"]);
}

#[test]
fn test_snapshot_without_time_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    fs::write(&path, "[]").unwrap();

    let err = load_snapshot(&path, None).unwrap_err();
    assert!(matches!(err, WaitlistError::SnapshotUnreadable { .. }));
}

#[test]
fn test_extracted_page_loads_as_snapshot() {
    let page = r#"<table><tbody id="wait_list">
        <tr><td>1</td><td>Thu, 23 Jun 2022, 14:17:46 EDT</td><td>/22</td><td>/24</td></tr>
        <tr><td>2</td><td>Mon, 05 Dec 2022, 09:00:00 EST</td><td>/24</td><td>/24</td></tr>
        <tr><td>3</td><td>Tue, 06 Dec 2022, 09:00:00 EST</td><td>/20</td><td>/24</td></tr>
    </tbody></table>"#;

    let rows = extract_waitlist_rows(page);
    assert_eq!(rows.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.json");
    let document = json!({"timestamp": "2023-01-01T00:00:00Z", "requests": rows});
    fs::write(&path, document.to_string()).unwrap();

    let result = load_snapshot(&path, None).unwrap();

    // The /20 row survives extraction but is not a tracked size.
    assert_eq!(result.snapshot.len(), 2);
    assert_eq!(result.skipped.bad_size, 1);

    let row = derive_row(&result.snapshot, None, &ClearingRates::default());
    assert_eq!(row.requests.get(BlockSize::Large), 1);
    assert_eq!(row.requests.get(BlockSize::Small), 1);
    assert_eq!(row.flexible_requests, 1);
    assert_eq!(row.skipped_records, 1);
}
