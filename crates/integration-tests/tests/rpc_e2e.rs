//! JSON-RPC End-to-End Tests
//!
//! Drives the served method table over HTTP.

use std::sync::Arc;

use jobledger_api_rpc::error::code;
use jobledger_api_rpc::{RpcServer, RpcServerConfig};
use jobledger_core::port::id_provider::UuidProvider;
use jobledger_core::port::time_provider::SystemTimeProvider;
use jobledger_core::PersistenceGateway;
use jobledger_infra_sqlite::{create_pool, run_migrations, PoolConfig, SqliteDocumentStore};
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::server::ServerHandle;
use serde_json::{json, Value};

async fn serve(gateway: PersistenceGateway) -> (HttpClient, ServerHandle) {
    let config = RpcServerConfig {
        port: 0,
        ..Default::default()
    };
    let (addr, handle) = RpcServer::new(config, Arc::new(gateway))
        .start()
        .await
        .unwrap();
    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();
    (client, handle)
}

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

fn params(value: Value) -> ObjectParams {
    let mut params = ObjectParams::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            params.insert(&key, value).unwrap();
        }
    }
    params
}

fn paint_job() -> Value {
    json!({
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
    })
}

fn error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(obj) => obj.code(),
        other => panic!("expected call error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_record_lifecycle_over_rpc() {
    let (client, handle) = serve(primary_gateway().await).await;

    let created: Value = client
        .request(
            "records.create.v1",
            params(json!({"account_id": "u1", "record": paint_job()})),
        )
        .await
        .unwrap();
    assert_eq!(created["source"], "primary");
    let record_id = created["record_id"].as_str().unwrap().to_string();

    let updated: Value = client
        .request(
            "records.update.v1",
            params(json!({
                "account_id": "u1",
                "record_id": record_id,
                "patch": {"fuel_cost": 0, "phone": ""}
            })),
        )
        .await
        .unwrap();
    assert_eq!(updated, json!({"source": "primary", "updated": true}));

    let listed: Value = client
        .request("records.list.v1", params(json!({"account_id": "u1"})))
        .await
        .unwrap();
    let record = &listed["records"][0];
    assert_eq!(record["record_id"], json!(record_id));
    assert_eq!(record["fuel_cost"], 0.0);
    assert_eq!(record["material_cost"], 3000.0);
    assert_eq!(record["profit"], 4500.0);

    let summary: Value = client
        .request("records.summary.v1", params(json!({"account_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(summary["summary"]["record_count"], 1);

    let deleted: Value = client
        .request(
            "records.delete.v1",
            params(json!({"account_id": "u1", "record_id": record_id})),
        )
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);

    let err = client
        .request::<Value, _>(
            "records.delete.v1",
            params(json!({"account_id": "u1", "record_id": record_id})),
        )
        .await
        .unwrap_err();
    assert_eq!(error_code(err), code::STORE_ERROR);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_profile_over_rpc() {
    let (client, handle) = serve(primary_gateway().await).await;

    let err = client
        .request::<Value, _>("profile.get.v1", params(json!({"account_id": "u1"})))
        .await
        .unwrap_err();
    assert_eq!(error_code(err), code::NOT_FOUND);

    for fields in [json!({"name": "Dusan"}), json!({"hourly_rate": 450.5, "tags": ["paint"]})] {
        let saved: Value = client
            .request(
                "profile.upsert.v1",
                params(json!({"account_id": "u1", "fields": fields})),
            )
            .await
            .unwrap();
        assert_eq!(saved["saved"], true);
    }

    let profile: Value = client
        .request("profile.get.v1", params(json!({"account_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(
        profile["profile"],
        json!({"name": "Dusan", "hourly_rate": 450.5, "tags": ["paint"]})
    );

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_invalid_params_are_rejected() {
    let (client, handle) = serve(primary_gateway().await).await;

    let mut record = paint_job();
    record["gross_amount"] = json!("a lot");
    let err = client
        .request::<Value, _>(
            "records.create.v1",
            params(json!({"account_id": "u1", "record": record})),
        )
        .await
        .unwrap_err();
    // Malformed params never reach the gateway
    assert_eq!(error_code(err), jsonrpsee::types::error::INVALID_PARAMS_CODE);

    let mut record = paint_job();
    record["attachment_refs"] = json!([""]);
    let err = client
        .request::<Value, _>(
            "records.create.v1",
            params(json!({"account_id": "u1", "record": record})),
        )
        .await
        .unwrap_err();
    assert_eq!(error_code(err), code::VALIDATION_ERROR);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_deferred_mode_over_rpc() {
    let (client, handle) = serve(PersistenceGateway::unavailable()).await;

    let created: Value = client
        .request(
            "records.create.v1",
            params(json!({"account_id": "u1", "record": paint_job()})),
        )
        .await
        .unwrap();
    assert_eq!(created, json!({"source": "deferred"}));

    let profile: Value = client
        .request("profile.get.v1", params(json!({"account_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(profile, json!({"source": "deferred"}));

    let status: Value = client
        .request("system.status.v1", ObjectParams::new())
        .await
        .unwrap();
    assert_eq!(status["primary"], "unavailable");

    handle.stop().unwrap();
}
