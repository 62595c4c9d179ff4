//! Gateway Property Tests
//!
//! End-to-end behavior of the persistence gateway over a real SQLite store.

use std::collections::HashSet;
use std::sync::Arc;

use jobledger_core::domain::{AccountProfile, JobRecord, JobRecordPatch, ProfileValue};
use jobledger_core::port::id_provider::UuidProvider;
use jobledger_core::port::time_provider::SystemTimeProvider;
use jobledger_core::{FailureKind, Outcome, PersistenceGateway, Source};
use jobledger_infra_sqlite::{create_pool, run_migrations, PoolConfig, SqliteDocumentStore};
use serde_json::json;

async fn primary_gateway() -> PersistenceGateway {
    let pool = create_pool("sqlite::memory:", &PoolConfig::default())
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    let store = SqliteDocumentStore::new(
        pool,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    );
    PersistenceGateway::available(Arc::new(store))
}

fn paint_job() -> JobRecord {
    serde_json::from_value(json!({
        "date": "2025-01-15",
        "kind": "Paint",
        "client_name": "A",
        "gross_amount": 15000,
        "fee": 5000,
        "fee_offset": 0,
        "fuel_cost": 500,
        "material_cost": 3000,
        "helper_cost": 2000,
        "profit": 4500,
        "address": "X"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_paint_job_round_trip() {
    let gateway = primary_gateway().await;

    let record_id = gateway
        .create_job_record("u1", &paint_job())
        .await
        .success()
        .expect("record should be created");
    assert!(!record_id.is_empty());

    let records = gateway.list_job_records("u1").await.success().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id, record_id);
    assert_eq!(records[0].record, paint_job());

    // Listing output is the stored fields with record_id merged in
    let listed = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(listed["record_id"], json!(record_id));
    assert_eq!(listed["client_name"], "A");
    assert_eq!(listed["gross_amount"], 15000.0);
}

#[tokio::test]
async fn test_create_then_list_many() {
    let gateway = primary_gateway().await;

    let mut created = HashSet::new();
    for i in 0..25 {
        let mut record = paint_job();
        record.client_name = format!("client-{}", i % 5);
        record.profit = i as f64;
        let id = gateway.create_job_record("u1", &record).await.success().unwrap();
        assert!(created.insert(id), "record ids must be unique");
    }

    let listed: HashSet<String> = gateway
        .list_job_records("u1")
        .await
        .success()
        .unwrap()
        .into_iter()
        .map(|r| r.record_id)
        .collect();
    assert_eq!(listed, created);
}

#[tokio::test]
async fn test_partial_update_changes_exactly_patched_fields() {
    let gateway = primary_gateway().await;

    let mut original = paint_job();
    original.fee_offset = 750.0;
    original.notes = "second floor".to_string();
    let record_id = gateway.create_job_record("u1", &original).await.success().unwrap();

    let patch: JobRecordPatch = serde_json::from_value(json!({
        "fee_offset": 0,
        "notes": ""
    }))
    .unwrap();
    assert_eq!(
        gateway.update_job_record("u1", &record_id, &patch).await,
        Outcome::Success(())
    );

    let stored = gateway.list_job_records("u1").await.success().unwrap();
    let record = &stored[0].record;
    assert_eq!(record.fee_offset, 0.0);
    assert_eq!(record.notes, "");

    let mut expected = original.clone();
    expected.fee_offset = 0.0;
    expected.notes = String::new();
    assert_eq!(record, &expected);
}

#[tokio::test]
async fn test_fractional_amounts_read_back_exactly() {
    let gateway = primary_gateway().await;

    let mut original = paint_job();
    original.fee_offset = 123456789.12345679;
    original.gross_amount = 0.1 + 0.2;
    let record_id = gateway.create_job_record("u1", &original).await.success().unwrap();

    let patch: JobRecordPatch =
        serde_json::from_value(json!({"fuel_cost": 987654321.98765432})).unwrap();
    assert_eq!(
        gateway.update_job_record("u1", &record_id, &patch).await,
        Outcome::Success(())
    );

    let stored = gateway.list_job_records("u1").await.success().unwrap();
    let mut expected = original;
    expected.fuel_cost = 987654321.98765432;
    assert_eq!(stored[0].record, expected);
    assert_eq!(stored[0].record.fee_offset.to_bits(), 123456789.12345679f64.to_bits());
}

#[tokio::test]
async fn test_delete_then_delete_again() {
    let gateway = primary_gateway().await;

    let keep = gateway.create_job_record("u1", &paint_job()).await.success().unwrap();
    let gone = gateway.create_job_record("u1", &paint_job()).await.success().unwrap();

    assert!(gateway.delete_job_record("u1", &gone).await.succeeded());

    let ids: Vec<String> = gateway
        .list_job_records("u1")
        .await
        .success()
        .unwrap()
        .into_iter()
        .map(|r| r.record_id)
        .collect();
    assert_eq!(ids, vec![keep]);

    // Second delete is a non-success that does not crash
    let again = gateway.delete_job_record("u1", &gone).await;
    assert!(!again.succeeded());
    assert_eq!(again, Outcome::NotFound);
}

#[tokio::test]
async fn test_update_missing_record_is_not_success() {
    let gateway = primary_gateway().await;
    let patch = JobRecordPatch {
        fee: Some(10.0),
        ..Default::default()
    };

    let outcome = gateway.update_job_record("u1", "does-not-exist", &patch).await;
    assert!(!outcome.succeeded());
}

#[tokio::test]
async fn test_profile_upserts_merge() {
    let gateway = primary_gateway().await;

    let first = AccountProfile::new().with("name", "Dusan").with("vehicle", "Transit");
    let second = AccountProfile::new()
        .with("phone", "+420 777")
        .with("onboarded", true);

    assert!(gateway.upsert_account_profile("u1", &first).await.succeeded());
    assert!(gateway.upsert_account_profile("u1", &second).await.succeeded());

    let profile = gateway.get_account_profile("u1").await.success().unwrap();
    assert_eq!(profile.len(), 4);
    assert_eq!(profile.get("vehicle"), Some(&ProfileValue::from("Transit")));
    assert_eq!(profile.get("onboarded"), Some(&ProfileValue::Bool(true)));
}

#[tokio::test]
async fn test_missing_profile_is_not_found() {
    let gateway = primary_gateway().await;
    assert_eq!(gateway.get_account_profile("nobody").await, Outcome::NotFound);
}

#[tokio::test]
async fn test_accounts_are_isolated() {
    let gateway = primary_gateway().await;

    let id = gateway.create_job_record("u1", &paint_job()).await.success().unwrap();

    assert!(gateway.list_job_records("u2").await.success().unwrap().is_empty());
    assert!(!gateway.delete_job_record("u2", &id).await.succeeded());
    assert_eq!(gateway.list_job_records("u1").await.success().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_record_is_rejected_without_write() {
    let gateway = primary_gateway().await;

    let mut record = paint_job();
    record.duration_days = Some(-2);
    assert_eq!(
        gateway.create_job_record("u1", &record).await,
        Outcome::Failure(FailureKind::Rejected)
    );
    assert!(gateway.list_job_records("u1").await.success().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_mode_for_whole_lifetime() {
    let gateway = PersistenceGateway::unavailable();
    let patch = JobRecordPatch {
        fee: Some(1.0),
        ..Default::default()
    };

    // Repeated calls never recover
    for _ in 0..3 {
        assert!(gateway.create_job_record("u1", &paint_job()).await.is_deferred());
        let listed = gateway.list_job_records("u1").await;
        assert_eq!(listed.source(), Source::Deferred);
        assert!(listed.unwrap_or_default().is_empty());
        assert!(gateway.update_job_record("u1", "r1", &patch).await.is_deferred());
        assert!(gateway.delete_job_record("u1", "r1").await.is_deferred());
        assert!(gateway
            .upsert_account_profile("u1", &AccountProfile::new().with("a", 1i64))
            .await
            .is_deferred());
        assert!(gateway.get_account_profile("u1").await.is_deferred());
        assert!(gateway.summarize_job_records("u1").await.is_deferred());
    }
}

#[tokio::test]
async fn test_summary_over_stored_records() {
    let gateway = primary_gateway().await;

    let mut second = paint_job();
    second.client_name = "B".to_string();
    second.profit = 1500.0;
    gateway.create_job_record("u1", &paint_job()).await.success().unwrap();
    gateway.create_job_record("u1", &second).await.success().unwrap();

    let summary = gateway.summarize_job_records("u1").await.success().unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.total_gross, 30000.0);
    assert_eq!(summary.total_profit, 6000.0);
    assert_eq!(summary.average_profit, 3000.0);
    assert_eq!(summary.clients.get("A"), Some(&1));
    assert_eq!(summary.clients.get("B"), Some(&1));
}
