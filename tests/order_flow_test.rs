// ==========================================
// 订单完成流程集成测试
// ==========================================
// 测试范围: AppState → OrderApi → OrderAssembler → SQLite（库存 + 生产日志）
// ==========================================


use chrono::NaiveDate;
use coil_inventory::api::ApiError;
use coil_inventory::app::AppState;
use coil_inventory::domain::{Order, OrderDraft, ProductionLine};
use coil_inventory::engine::{
    AllocationResult, CollaboratorError, NotificationSink, WarningKind,
};
use std::sync::Arc;
use test_helpers::*;

const EPS: f64 = 1e-9;

fn ts() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 4, 1)
        .unwrap()
        .and_hms_opt(14, 5, 0)
        .unwrap()
}

fn expect_order_failure(result: Result<impl std::fmt::Debug, ApiError>, expected_kind: &str) {
    match result {
        Err(ApiError::OrderFailed { kind, .. }) => assert_eq!(kind, expected_kind),
        other => panic!("expected {} failure, got {:?}", expected_kind, other),
    }
}

// ==========================================
// 场景1: 单卷完成订单
// ==========================================

#[test]
fn test_single_coil_order_updates_inventory_and_log() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 50.0), ("C2", 30.0)]).unwrap();

    let receipt = state
        .order_api
        .submit_order_at(&single_line_order("SO-1", &["C1"]), ts())
        .unwrap();

    let expected = 10.0 * 18.5 / 12.0 + 2.0;
    assert!((receipt.total_footage - expected).abs() < EPS);
    assert!(!receipt.has_warnings());
    assert!((footage_of(&state, "C1") - 32.583_333_333_333_33).abs() < 1e-9);
    assert_eq!(footage_of(&state, "C2"), 30.0);

    let rows = state.order_api.find_logs_by_order("SO-1").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, ts());
    assert_eq!(rows[0].size, "3x3");
    assert_eq!(rows[0].pieces, 10);
    assert_eq!(rows[0].coils_used, "C1");
    assert_eq!(rows[0].box_usage, "Small: 2");
    assert!((rows[0].line_footage - expected).abs() < EPS);

    let summary = state.order_api.find_order_summary("SO-1").unwrap().unwrap();
    assert_eq!(summary.line_count, 1);
    assert_eq!(summary.total_pieces, 10);
    assert!((summary.total_footage - expected).abs() < EPS);
}

// ==========================================
// 场景2: 均分到两卷
// ==========================================

#[test]
fn test_line_split_evenly_across_coils() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 10.0), ("C2", 10.0)]).unwrap();

    let receipt = state
        .order_api
        .submit_order_at(&single_line_order("SO-2", &["C1", "C2"]), ts())
        .unwrap();

    assert_eq!(receipt.lines[0].debits.len(), 2);
    for coil_id in ["C1", "C2"] {
        assert!((footage_of(&state, coil_id) - 1.291_666_666_666_666).abs() < 1e-9);
    }
    assert_eq!(receipt.log_rows[0].coils_used, "C1,C2");
}

// ==========================================
// 场景3: 任一卷不足 → 整单失败,库存与日志均不变
// ==========================================

#[test]
fn test_insufficient_coil_leaves_database_unchanged() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 10.0), ("C2", 5.0)]).unwrap();
    let before = state.coil_repo.list_all().unwrap();

    let result = state
        .order_api
        .submit_order_at(&single_line_order("SO-3", &["C1", "C2"]), ts());

    expect_order_failure(result, "InsufficientFootage");
    assert_eq!(state.coil_repo.list_all().unwrap(), before);
    assert_eq!(state.production_log_repo.count_rows().unwrap(), 0);
    assert!(state.order_api.find_order_summary("SO-3").unwrap().is_none());
}

#[test]
fn test_later_line_failure_rolls_back_earlier_lines() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 100.0), ("C2", 1.0)]).unwrap();

    let mut draft = OrderDraft::new("ACME Roofing", "SO-4", "kim");
    draft.add_line(ProductionLine::new("2x2", 12, 0.0).with_coils(["C1"]));
    draft.add_line(ProductionLine::new("2x2", 12, 0.0).with_coils(["C2"]));
    let result = state.order_api.submit_order_at(&draft.into_order(), ts());

    expect_order_failure(result, "InsufficientFootage");
    assert_eq!(footage_of(&state, "C1"), 100.0);
    assert_eq!(footage_of(&state, "C2"), 1.0);
}

// ==========================================
// 场景4: 选卷与字段校验
// ==========================================

#[test]
fn test_no_coils_selected() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 50.0)]).unwrap();

    let result = state
        .order_api
        .submit_order_at(&single_line_order("SO-5", &[]), ts());

    expect_order_failure(result, "NoCoilsSelected");
    assert_eq!(footage_of(&state, "C1"), 50.0);
}

#[test]
fn test_global_selection_used_when_line_has_none() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 50.0), ("G1", 50.0)]).unwrap();

    let mut draft = OrderDraft::new("ACME Roofing", "SO-6", "kim").with_global_coils(["G1"]);
    draft.add_line(ProductionLine::new("2x2", 12, 0.0));
    draft.add_line(ProductionLine::new("2x2", 12, 0.0).with_coils(["C1"]));
    let receipt = state
        .order_api
        .submit_order_at(&draft.into_order(), ts())
        .unwrap();

    assert_eq!(receipt.log_rows[0].coils_used, "G1");
    assert_eq!(receipt.log_rows[1].coils_used, "C1");
    assert_eq!(footage_of(&state, "G1"), 37.0);
    assert_eq!(footage_of(&state, "C1"), 37.0);
}

#[test]
fn test_missing_fields_and_unknown_references() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 50.0)]).unwrap();

    let mut order = single_line_order("SO-7", &["C1"]);
    order.operator = "  ".to_string();
    expect_order_failure(state.order_api.submit_order_at(&order, ts()), "InvalidOrderFields");

    let mut order = single_line_order("SO-7", &["C1"]);
    order.lines[0].size = "9x9".to_string();
    expect_order_failure(state.order_api.submit_order_at(&order, ts()), "UnknownSize");

    let order = single_line_order("SO-7", &["NOPE"]);
    expect_order_failure(state.order_api.submit_order_at(&order, ts()), "UnknownCoil");

    assert_eq!(footage_of(&state, "C1"), 50.0);
    assert_eq!(state.production_log_repo.count_rows().unwrap(), 0);
}

// ==========================================
// 场景5: 守恒性质
// ==========================================

#[test]
fn test_footage_conservation_across_lines() {
    let (_dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 200.0), ("C2", 150.0), ("C3", 90.0)]).unwrap();
    let before = state.coil_repo.list_all().unwrap();

    let mut draft = OrderDraft::new("ACME Roofing", "SO-8", "kim")
        .with_extra_inch_allowance(0.25)
        .with_global_coils(["C1", "C2"]);
    draft.add_line(ProductionLine::new("4x4", 7, 1.5));
    draft.add_line(ProductionLine::new("6x8", 3, 0.0).with_coils(["C2", "C3"]));
    draft.add_line(ProductionLine::new("2x3", 25, 3.25).with_coils(["C3", "C1", "C3"]));
    let receipt = state
        .order_api
        .submit_order_at(&draft.into_order(), ts())
        .unwrap();

    let result = AllocationResult {
        lines: receipt.lines.clone(),
        total_footage: receipt.total_footage,
    };
    let debits = result.debits_by_coil();
    let debit_sum: f64 = debits.values().sum();
    assert!((debit_sum - receipt.total_footage).abs() < 1e-9);

    for coil in before {
        let debited = debits.get(&coil.coil_id).copied().unwrap_or(0.0);
        let after = footage_of(&state, &coil.coil_id);
        assert!(after >= 0.0);
        assert!((coil.footage - debited - after).abs() < 1e-9);
    }
    assert_eq!(state.production_log_repo.count_rows().unwrap(), 3);
}

// ==========================================
// 场景6: 通知失败降级为警告
// ==========================================

struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn notify(&self, _order: &Order, _result: &AllocationResult) -> Result<(), CollaboratorError> {
        Err("smtp unreachable".into())
    }
}

#[test]
fn test_notification_failure_is_warning_only() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("notify.db").to_string_lossy().to_string();
    let state = AppState::with_notifier(db_path, Arc::new(FailingNotifier)).unwrap();
    seed_coils(&state, &[("C1", 50.0)]).unwrap();

    let receipt = state
        .order_api
        .submit_order_at(&single_line_order("SO-9", &["C1"]), ts())
        .unwrap();

    assert_eq!(receipt.warnings.len(), 1);
    assert_eq!(receipt.warnings[0].kind, WarningKind::NotificationFailed);
    assert!((footage_of(&state, "C1") - 32.583_333_333_333_33).abs() < 1e-9);
    assert_eq!(state.production_log_repo.count_rows().unwrap(), 1);
}

// ==========================================
// 场景7: 日志查询与导出
// ==========================================

#[test]
fn test_recent_logs_and_csv_export() {
    let (dir, state) = create_test_state().unwrap();
    seed_coils(&state, &[("C1", 500.0)]).unwrap();

    for number in ["SO-10", "SO-11", "SO-12"] {
        state
            .order_api
            .submit_order_at(&single_line_order(number, &["C1"]), ts())
            .unwrap();
    }

    let recent = state.order_api.list_recent_logs(2).unwrap();
    let numbers: Vec<&str> = recent.iter().map(|r| r.order_number.as_str()).collect();
    assert_eq!(numbers, vec!["SO-12", "SO-11"]);

    let export_path = dir.path().join("logs.csv");
    let count = state.order_api.export_logs_csv(&export_path).unwrap();
    assert_eq!(count, 3);

    let mut reader = csv::Reader::from_path(&export_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Timestamp");
    assert_eq!(&headers[7], "CoilsUsed");
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][0], "2026-04-01 14:05:00");
    assert_eq!(&records[0][3], "SO-10");
    assert_eq!(&records[2][8], "Small: 2");
}
