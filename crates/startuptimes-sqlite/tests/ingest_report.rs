use anyhow::Result;
use rusqlite::Connection;
use serde_json::{json, Value};
use startuptimes_core::{Notice, RecordingSink};
use startuptimes_sqlite::{IngestSummary, ReportRow, Store, StoreError};
use std::time::{Duration, Instant};

fn iphone_entry(timestamp: &str, total: f64, model: &str) -> Value {
    json!({
        "device": {
            "cpuCores": 6,
            "memory": 6_000_000_000i64,
            "model": model,
            "modelID": "iPhone14,3",
            "modelIDRefURL": "https://www.theiphonewiki.com/wiki/Models",
            "systemName": "iOS",
            "systemVersion": "16.0"
        },
        "iTwinVersion": "4.0.0",
        "title": "Mobile Starter",
        "timestamp": timestamp,
        "totalTime": total,
        "usingRemoteServer": false,
        "checkpoints": [
            { "action": "Launch", "timestamp": timestamp, "step": 0.0, "total": 0.0 },
            { "action": "Frontend ready", "timestamp": timestamp, "step": total, "total": total }
        ]
    })
}

#[test]
fn two_runs_average_and_resubmission_is_ignored() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("StartupTimes.db");

    let sink = RecordingSink::new();
    let mut store = Store::open(&path)?.with_sink(sink.clone());
    let summary = store.ingest(&json!([
        iphone_entry("2022-10-01T10:00:00Z", 3.25, "iPhone 13 Pro Max"),
        iphone_entry("2022-10-01T11:00:00Z", 2.75, "iPhone 13 Pro Max (renamed)"),
    ]))?;
    let expected = IngestSummary {
        inserted: 2,
        duplicates: 0,
        checkpoints: 4,
    };
    assert_eq!(summary, expected);
    store.close()?;

    // a later session resubmits the first run
    let mut store = Store::open(&path)?.with_sink(sink.clone());
    let summary = store.ingest(&iphone_entry("2022-10-01T10:00:00Z", 3.25, "iPhone 13 Pro Max"))?;
    assert_eq!(summary.duplicates, 1);

    let report = store.build_report()?;
    assert_eq!(
        report,
        vec![ReportRow {
            model_id: "iPhone14,3".into(),
            itwin_version: "4.0.0".into(),
            average_time: 3.0,
            samples: 2,
        }]
    );
    let table = store.report_table()?;
    assert!(table.lines().nth(2).unwrap().contains("3.000s"));

    let notices = sink.notices();
    let created = notices
        .iter()
        .filter(|n| matches!(n, Notice::DeviceCreated { .. }))
        .count();
    assert_eq!(created, 1);
    let skipped = Notice::DuplicateEntry {
        model_id: "iPhone14,3".into(),
        timestamp: "2022-10-01T10:00:00Z".into(),
    };
    assert_eq!(notices.last(), Some(&skipped));
    Ok(())
}

#[test]
fn foreign_file_layout_is_refused() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("other.db");
    let conn = Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE Props (id INTEGER PRIMARY KEY, namespace TEXT, name TEXT, value TEXT);
         INSERT INTO Props VALUES (1, 'startuptimes', 'schemaVersion', '0.9');",
    )?;
    drop(conn);

    match Store::open(&path) {
        Err(StoreError::Schema { found, .. }) => assert!(found.contains("0.9"), "{found}"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("mismatched schema was accepted"),
    }
    Ok(())
}

#[test]
fn unopenable_path_is_a_storage_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("missing-dir").join("times.db");
    assert!(matches!(Store::open(&path), Err(StoreError::Storage(_))));
    Ok(())
}

#[test]
fn locked_file_fails_without_waiting() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("StartupTimes.db");
    let mut store = Store::open(&path)?;

    let other = Connection::open(&path)?;
    other.execute_batch("BEGIN IMMEDIATE;")?;

    let started = Instant::now();
    let err = store
        .ingest(&iphone_entry("2022-10-01T10:00:00Z", 3.25, "iPhone 13 Pro Max"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)), "{err}");
    assert!(started.elapsed() < Duration::from_secs(2));

    other.execute_batch("ROLLBACK;")?;
    assert_eq!(store.build_report()?, Vec::new());
    Ok(())
}
