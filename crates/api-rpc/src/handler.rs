//! RPC Method Handlers
//!
//! Turns gateway outcomes into responses. Deferred outcomes are successful
//! responses with `source: "deferred"`; failures carry no root cause.

use crate::error::{failure_error, not_found_error, throttled_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AccountRequest, CreateRecordRequest, CreateRecordResponse, DeleteRecordRequest,
    DeleteRecordResponse, ListRecordsResponse, ProfileResponse, StatusResponse, SummaryResponse,
    UpdateRecordRequest, UpdateRecordResponse, UpsertProfileRequest, UpsertProfileResponse,
};
use jobledger_core::{FailureKind, Outcome, PersistenceGateway, Source};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    gateway: Arc<PersistenceGateway>,
    rate_limiter: Arc<RateLimiter>,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(gateway: Arc<PersistenceGateway>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            gateway,
            rate_limiter,
            start_time: Instant::now(),
        }
    }

    fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.try_acquire() {
            Ok(())
        } else {
            warn!(
                retry_after_ms = self.rate_limiter.retry_after().as_millis() as u64,
                "Request throttled"
            );
            Err(throttled_error())
        }
    }

    /// records.list.v1
    ///
    /// A failed listing answers with an empty list, same as an account
    /// without records.
    pub async fn list_records(
        &self,
        params: AccountRequest,
    ) -> Result<ListRecordsResponse, ErrorObjectOwned> {
        self.throttle()?;

        let outcome = self.gateway.list_job_records(&params.account_id).await;
        match outcome {
            Outcome::Failure(FailureKind::Rejected) => Err(failure_error(FailureKind::Rejected)),
            outcome => Ok(ListRecordsResponse {
                source: outcome.source(),
                records: outcome.unwrap_or_default(),
            }),
        }
    }

    /// records.create.v1
    pub async fn create_record(
        &self,
        params: CreateRecordRequest,
    ) -> Result<CreateRecordResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self
            .gateway
            .create_job_record(&params.account_id, &params.record)
            .await
        {
            Outcome::Success(record_id) => Ok(CreateRecordResponse {
                source: Source::Primary,
                record_id: Some(record_id),
            }),
            Outcome::Deferred => Ok(CreateRecordResponse {
                source: Source::Deferred,
                record_id: None,
            }),
            Outcome::Failure(kind) => Err(failure_error(kind)),
            Outcome::NotFound => Err(failure_error(FailureKind::Internal)),
        }
    }

    /// records.update.v1
    ///
    /// Updating a record that does not exist is reported like any other
    /// failed write.
    pub async fn update_record(
        &self,
        params: UpdateRecordRequest,
    ) -> Result<UpdateRecordResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self
            .gateway
            .update_job_record(&params.account_id, &params.record_id, &params.patch)
            .await
        {
            Outcome::Success(()) => Ok(UpdateRecordResponse {
                source: Source::Primary,
                updated: true,
            }),
            Outcome::Deferred => Ok(UpdateRecordResponse {
                source: Source::Deferred,
                updated: false,
            }),
            Outcome::Failure(kind) => Err(failure_error(kind)),
            Outcome::NotFound => Err(failure_error(FailureKind::Internal)),
        }
    }

    /// records.delete.v1
    pub async fn delete_record(
        &self,
        params: DeleteRecordRequest,
    ) -> Result<DeleteRecordResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self
            .gateway
            .delete_job_record(&params.account_id, &params.record_id)
            .await
        {
            Outcome::Success(()) => Ok(DeleteRecordResponse {
                source: Source::Primary,
                deleted: true,
            }),
            Outcome::Deferred => Ok(DeleteRecordResponse {
                source: Source::Deferred,
                deleted: false,
            }),
            Outcome::Failure(kind) => Err(failure_error(kind)),
            Outcome::NotFound => Err(failure_error(FailureKind::Internal)),
        }
    }

    /// records.summary.v1
    pub async fn summary(
        &self,
        params: AccountRequest,
    ) -> Result<SummaryResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self.gateway.summarize_job_records(&params.account_id).await {
            Outcome::Success(summary) => Ok(SummaryResponse {
                source: Source::Primary,
                summary: Some(summary),
            }),
            Outcome::Deferred => Ok(SummaryResponse {
                source: Source::Deferred,
                summary: None,
            }),
            Outcome::Failure(kind) => Err(failure_error(kind)),
            Outcome::NotFound => Err(failure_error(FailureKind::Internal)),
        }
    }

    /// profile.get.v1
    pub async fn get_profile(
        &self,
        params: AccountRequest,
    ) -> Result<ProfileResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self.gateway.get_account_profile(&params.account_id).await {
            Outcome::Success(profile) => Ok(ProfileResponse {
                source: Source::Primary,
                profile: Some(profile),
            }),
            Outcome::Deferred => Ok(ProfileResponse {
                source: Source::Deferred,
                profile: None,
            }),
            Outcome::NotFound => Err(not_found_error(format!(
                "Account {} not found",
                params.account_id
            ))),
            Outcome::Failure(kind) => Err(failure_error(kind)),
        }
    }

    /// profile.upsert.v1
    pub async fn upsert_profile(
        &self,
        params: UpsertProfileRequest,
    ) -> Result<UpsertProfileResponse, ErrorObjectOwned> {
        self.throttle()?;

        match self
            .gateway
            .upsert_account_profile(&params.account_id, &params.fields)
            .await
        {
            Outcome::Success(()) => Ok(UpsertProfileResponse {
                source: Source::Primary,
                saved: true,
            }),
            Outcome::Deferred => Ok(UpsertProfileResponse {
                source: Source::Deferred,
                saved: false,
            }),
            Outcome::Failure(kind) => Err(failure_error(kind)),
            Outcome::NotFound => Err(failure_error(FailureKind::Internal)),
        }
    }

    /// system.status.v1
    pub async fn status(&self) -> Result<StatusResponse, ErrorObjectOwned> {
        Ok(StatusResponse {
            version: jobledger_core::VERSION.to_string(),
            primary: self.gateway.availability(),
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use jobledger_core::port::id_provider::UuidProvider;
    use jobledger_core::port::time_provider::SystemTimeProvider;
    use jobledger_infra_sqlite::{create_pool, run_migrations, PoolConfig, SqliteDocumentStore};
    use serde_json::json;

    async fn primary_handler(limiter: RateLimiter) -> RpcHandler {
        let pool = create_pool("sqlite::memory:", &PoolConfig::default())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteDocumentStore::new(
            pool,
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        );
        RpcHandler::new(
            Arc::new(PersistenceGateway::available(Arc::new(store))),
            Arc::new(limiter),
        )
    }

    fn deferred_handler() -> RpcHandler {
        RpcHandler::new(
            Arc::new(PersistenceGateway::unavailable()),
            Arc::new(RateLimiter::new(100, 100)),
        )
    }

    fn create_request(account_id: &str) -> CreateRecordRequest {
        serde_json::from_value(json!({
            "account_id": account_id,
            "record": {
                "date": "15. 01. 2025",
                "kind": "Paint",
                "client_name": "A",
                "external_reference": "202501",
                "gross_amount": 15000,
                "fee": 5000,
                "fee_offset": 0,
                "fuel_cost": 500,
                "material_cost": 3000,
                "helper_cost": 2000,
                "profit": 4500,
                "address": "X"
            }
        }))
        .unwrap()
    }

    fn account(account_id: &str) -> AccountRequest {
        AccountRequest {
            account_id: account_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete_on_primary() {
        let handler = primary_handler(RateLimiter::new(100, 100)).await;

        let created = handler.create_record(create_request("u1")).await.unwrap();
        assert_eq!(created.source, Source::Primary);
        let record_id = created.record_id.unwrap();

        let listed = handler.list_records(account("u1")).await.unwrap();
        assert_eq!(listed.records.len(), 1);
        assert_eq!(listed.records[0].record_id, record_id);

        let deleted = handler
            .delete_record(DeleteRecordRequest {
                account_id: "u1".to_string(),
                record_id: record_id.clone(),
            })
            .await
            .unwrap();
        assert!(deleted.deleted);

        // Second delete collapses into a generic failure
        let again = handler
            .delete_record(DeleteRecordRequest {
                account_id: "u1".to_string(),
                record_id,
            })
            .await
            .unwrap_err();
        assert_eq!(again.code(), code::STORE_ERROR);
    }

    #[tokio::test]
    async fn test_deferred_responses() {
        let handler = deferred_handler();

        let created = handler.create_record(create_request("u1")).await.unwrap();
        assert_eq!(created.source, Source::Deferred);
        assert!(created.record_id.is_none());

        let listed = handler.list_records(account("u1")).await.unwrap();
        assert_eq!(listed.source, Source::Deferred);
        assert!(listed.records.is_empty());

        let profile = handler.get_profile(account("u1")).await.unwrap();
        assert_eq!(profile.source, Source::Deferred);
        assert!(profile.profile.is_none());

        let value = serde_json::to_value(&created).unwrap();
        assert_eq!(value, json!({"source": "deferred"}));
    }

    #[tokio::test]
    async fn test_profile_not_found_and_upsert() {
        let handler = primary_handler(RateLimiter::new(100, 100)).await;

        let missing = handler.get_profile(account("u9")).await.unwrap_err();
        assert_eq!(missing.code(), code::NOT_FOUND);

        let saved = handler
            .upsert_profile(
                serde_json::from_value(json!({
                    "account_id": "u9",
                    "fields": {"name": "Dusan", "role": "owner"}
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        assert!(saved.saved);

        let profile = handler.get_profile(account("u9")).await.unwrap();
        assert_eq!(profile.profile.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_payload_maps_to_validation_error() {
        let handler = primary_handler(RateLimiter::new(100, 100)).await;

        let err = handler.list_records(account(" ")).await.unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_throttled_requests() {
        let handler = primary_handler(RateLimiter::new(1, 0)).await;

        assert!(handler.list_records(account("u1")).await.is_ok());
        let err = handler.list_records(account("u1")).await.unwrap_err();
        assert_eq!(err.code(), code::THROTTLED);

        // Status is never throttled
        assert!(handler.status().await.is_ok());
    }
}
