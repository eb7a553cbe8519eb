use super::ProductionLogRepository;
use crate::domain::production_log::{AuditRecord, LogRow, OrderSummary};
use crate::engine::collaborators::AuditSink;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn ts(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 10)
        .unwrap()
        .and_hms_opt(hour, 15, 0)
        .unwrap()
}

fn make_test_row(order_number: &str, size: &str, footage: f64, hour: u32) -> LogRow {
    LogRow {
        timestamp: ts(hour),
        operator: "kim".to_string(),
        client: "ACME".to_string(),
        order_number: order_number.to_string(),
        size: size.to_string(),
        pieces: 10,
        waste: 2.0,
        coils_used: "C1,C2".to_string(),
        box_usage: "Small: 2".to_string(),
        line_footage: footage,
    }
}

fn make_test_record(order_number: &str, rows: Vec<LogRow>) -> AuditRecord {
    let total: f64 = rows.iter().map(|r| r.line_footage).sum();
    AuditRecord {
        summary: OrderSummary {
            timestamp: rows[0].timestamp,
            order_number: order_number.to_string(),
            client: "ACME".to_string(),
            operator: "kim".to_string(),
            line_count: rows.len(),
            total_pieces: rows.iter().map(|r| u64::from(r.pieces)).sum(),
            total_footage: total,
            box_usage: "Small: 2".to_string(),
        },
        rows,
    }
}

#[test]
fn test_append_and_find_by_order_number() {
    let repo = ProductionLogRepository::new(setup_test_db());

    let record = make_test_record(
        "SO-1",
        vec![make_test_row("SO-1", "3x3", 17.5, 9), make_test_row("SO-1", "2x2", 13.0, 9)],
    );
    let record_id = repo.append_record(&record).unwrap();
    assert_eq!(record_id.len(), 36);

    let rows = repo.find_by_order_number("SO-1").unwrap();
    assert_eq!(rows, record.rows);
    assert!(repo.find_by_order_number("SO-404").unwrap().is_empty());
}

#[test]
fn test_list_recent_newest_first() {
    let repo = ProductionLogRepository::new(setup_test_db());

    repo.append_record(&make_test_record("SO-1", vec![make_test_row("SO-1", "3x3", 1.0, 8)]))
        .unwrap();
    repo.append_record(&make_test_record("SO-2", vec![make_test_row("SO-2", "4x4", 2.0, 9)]))
        .unwrap();
    repo.append_record(&make_test_record("SO-3", vec![make_test_row("SO-3", "5x5", 3.0, 10)]))
        .unwrap();

    let recent = repo.list_recent(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].order_number, "SO-3");
    assert_eq!(recent[1].order_number, "SO-2");
    assert_eq!(repo.list_all().unwrap().len(), 3);
    assert_eq!(repo.count_rows().unwrap(), 3);
}

#[test]
fn test_summaries_by_order() {
    let repo = ProductionLogRepository::new(setup_test_db());

    let record = make_test_record(
        "SO-7",
        vec![make_test_row("SO-7", "3x3", 10.0, 11), make_test_row("SO-7", "3x3", 5.5, 11)],
    );
    repo.append_record(&record).unwrap();

    let summaries = repo.find_summaries_by_order("SO-7").unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0], record.summary);
    assert_eq!(summaries[0].total_footage, 15.5);
}

#[test]
fn test_audit_sink_returns_row_count() {
    let repo = ProductionLogRepository::new(setup_test_db());
    let sink: &dyn AuditSink = &repo;

    let record = make_test_record("SO-9", vec![make_test_row("SO-9", "6x6", 4.0, 12)]);
    assert_eq!(sink.append(&record).unwrap(), 1);
}
