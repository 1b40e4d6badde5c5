// ==========================================
// 同步/排除清单/历史回看 场景测试
// ==========================================
// 测试目标: 经由公开接口验证各引擎在真实 SQLite 上的组合行为
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use inventory_sync::domain::{ActivateOutcome, DeactivateOutcome};
use inventory_sync::engine::{ExclusionRegistry, NoOpObserver, SyncPipeline, TimeSeriesReconstructor};
use inventory_sync::repository::{ExclusionRepository, ProductRepository, WeeklyRecordRepository};
use inventory_sync::{InventorySession, LabelGranularity, SyncAnchor, SyncMode, WeekRange};
use rust_xlsxwriter::Workbook;
use test_helpers::{create_test_db, sheet, test_config, TestRow, HEADERS};

#[test]
fn test_same_anchor_resync_overwrites_single_slot() {
    let (_dir, factory) = create_test_db().unwrap();
    let anchor = SyncAnchor::new(2025, 3, 1).unwrap();
    let mut conn = factory.acquire().unwrap();

    let mut session = InventorySession::new(test_config(&factory), factory.clone());
    session.ingest(&sheet(&[TestRow::new("200", "5")])).unwrap();
    SyncPipeline::run(
        &mut conn,
        session.snapshot().rows(),
        anchor,
        SyncMode::Silent,
        &NoOpObserver,
    )
    .unwrap();

    session.ingest(&sheet(&[TestRow::new("200", "7")])).unwrap();
    SyncPipeline::run(
        &mut conn,
        session.snapshot().rows(),
        anchor,
        SyncMode::Silent,
        &NoOpObserver,
    )
    .unwrap();

    let pid = ProductRepository::new(&conn)
        .find_id_by_article("200")
        .unwrap()
        .unwrap();
    let record = WeeklyRecordRepository::new(&conn)
        .find(pid, 2025, 3)
        .unwrap()
        .unwrap();
    assert_eq!(record.slots, [None, Some(7.0), None, None, None, None, None]);
}

#[test]
fn test_days_of_one_week_fill_independent_slots() {
    let (_dir, factory) = create_test_db().unwrap();
    let mut conn = factory.acquire().unwrap();
    let rows = sheet(&[TestRow::new("1", "4")]);
    let mut session = InventorySession::new(test_config(&factory), factory.clone());
    session.ingest(&rows).unwrap();

    for weekday in [0, 2, 6] {
        let anchor = SyncAnchor::new(2025, 10, weekday).unwrap();
        SyncPipeline::run(
            &mut conn,
            session.snapshot().rows(),
            anchor,
            SyncMode::Silent,
            &NoOpObserver,
        )
        .unwrap();
    }

    let pid = ProductRepository::new(&conn)
        .find_id_by_article("1")
        .unwrap()
        .unwrap();
    let record = WeeklyRecordRepository::new(&conn)
        .find(pid, 2025, 10)
        .unwrap()
        .unwrap();
    assert_eq!(record.filled_slots(), 3);
    assert_eq!(WeeklyRecordRepository::new(&conn).count().unwrap(), 1);

    let series = TimeSeriesReconstructor::new(factory)
        .reconstruct("1", WeekRange::new(10, 10).unwrap())
        .unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.label_granularity(), LabelGranularity::Daily);
}

#[test]
fn test_history_spanning_weeks_uses_weekly_labels() {
    let (_dir, factory) = create_test_db().unwrap();
    let mut conn = factory.acquire().unwrap();
    let mut session = InventorySession::new(test_config(&factory), factory.clone());
    session.ingest(&sheet(&[TestRow::new("9", "1")])).unwrap();

    for week in [1, 2, 8] {
        SyncPipeline::run(
            &mut conn,
            session.snapshot().rows(),
            SyncAnchor::new(2025, week, 0).unwrap(),
            SyncMode::Silent,
            &NoOpObserver,
        )
        .unwrap();
    }

    let series = session.history("9", WeekRange::new(1, 2).unwrap()).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.points[0].date, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
    assert_eq!(series.points[1].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());

    let series = session
        .history_from_input("9", "abc", "", NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        .unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.label_granularity(), LabelGranularity::Weekly);
}

#[test]
fn test_activate_deactivate_activate_leaves_one_active_row() {
    let (_dir, factory) = create_test_db().unwrap();
    let registry = ExclusionRegistry::new(factory.clone());

    assert_eq!(registry.activate("100").unwrap(), ActivateOutcome::Inserted);
    assert_eq!(registry.deactivate("100").unwrap(), DeactivateOutcome::Deactivated);
    assert_eq!(registry.activate("100").unwrap(), ActivateOutcome::Reactivated);

    let conn = factory.acquire().unwrap();
    let repo = ExclusionRepository::new(&conn);
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.find("100").unwrap().unwrap().active);
}

#[test]
fn test_xlsx_upload_through_session() {
    let (dir, factory) = create_test_db().unwrap();
    let path = dir.path().join("inventory.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    worksheet.write_string(1, 0, "Grocery").unwrap();
    worksheet.write_string(1, 1, "Dairy").unwrap();
    worksheet.write_string(1, 2, "Milk 2L").unwrap();
    worksheet.write_number(1, 3, 100.0).unwrap();
    worksheet.write_number(1, 4, 0.0).unwrap();
    workbook.save(&path).unwrap();

    let mut session = InventorySession::new(test_config(&factory), factory);
    session.ingest_file(&path).unwrap();

    let row = session.snapshot().get("100").unwrap();
    assert_eq!(row.quantity, Some(0.0));
    assert!(session.find_zeros().unwrap().contains("100"));
}

#[test]
fn test_missing_column_rejects_whole_batch() {
    let (_dir, factory) = create_test_db().unwrap();
    let mut session = InventorySession::new(test_config(&factory), factory);
    session.ingest(&sheet(&[TestRow::new("1", "1")])).unwrap();

    let bad = inventory_sync::importer::RawSheet::from_rows(
        &["Department", "Article", "Inventory"],
        vec![vec!["Meat", "2", "0"]],
    );
    assert!(session.ingest(&bad).is_err());
    assert_eq!(session.snapshot().len(), 1);
    let meat = session
        .department_lights()
        .into_iter()
        .find(|l| l.group == "Meat")
        .unwrap();
    assert!(!meat.observed);
}

#[test]
fn test_year_end_week_maps_to_single_iso_date() {
    // 2025 年只有 52 个 ISO 周，2025-12-29 归属 2026-W01
    assert!(SyncAnchor::new(2025, 53, 0).is_none());
    let anchor = SyncAnchor::from_date(NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
    assert_eq!(anchor, SyncAnchor::new(2026, 1, 0).unwrap());

    let (_dir, factory) = create_test_db().unwrap();
    let mut conn = factory.acquire().unwrap();
    let mut session = InventorySession::new(test_config(&factory), factory.clone());
    session.ingest(&sheet(&[TestRow::new("77", "6")])).unwrap();
    SyncPipeline::run(
        &mut conn,
        session.snapshot().rows(),
        anchor,
        SyncMode::Silent,
        &NoOpObserver,
    )
    .unwrap();

    let pid = ProductRepository::new(&conn)
        .find_id_by_article("77")
        .unwrap()
        .unwrap();
    let records = WeeklyRecordRepository::new(&conn);
    assert!(records.find(pid, 2025, 53).unwrap().is_none());
    assert!(records.find(pid, 2026, 1).unwrap().is_some());

    let series = session.history("77", WeekRange::new(1, 53).unwrap()).unwrap();
    assert_eq!(series.len(), 1);
    let date = series.points[0].date;
    assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
    assert_eq!(SyncAnchor::from_date(date), anchor);
}
