// Persistence Gateway - single point of access to the primary store

use crate::application::outcome::{FailureKind, Outcome};
use crate::application::summary::{summarize, JobSummary};
use crate::domain::{
    validate_account_id, AccountProfile, JobRecord, JobRecordPatch, RecordId, StoredJobRecord,
};
use crate::error::{AppError, Result};
use crate::port::DocumentStore;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Primary store state, decided once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
}

/// Account-scoped CRUD over job records and profiles with graceful degradation.
///
/// Built once by the composition root and shared as `Arc<PersistenceGateway>`.
/// When the primary store could not be reached at startup, every operation
/// returns [`Outcome::Deferred`] for the rest of the process lifetime.
pub struct PersistenceGateway {
    store: Option<Arc<dyn DocumentStore>>,
}

impl PersistenceGateway {
    pub fn available(store: Arc<dyn DocumentStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn unavailable() -> Self {
        Self { store: None }
    }

    /// Run the one-shot connection attempt and settle on a mode.
    ///
    /// A failed (or panicking) attempt yields fallback mode instead of an
    /// error. There is no background reconnect.
    pub async fn initialize<F>(connect: F) -> Self
    where
        F: Future<Output = Result<Arc<dyn DocumentStore>>>,
    {
        match AssertUnwindSafe(connect).catch_unwind().await {
            Ok(Ok(store)) => {
                info!("Primary store session established");
                Self::available(store)
            }
            Ok(Err(e)) => {
                warn!(
                    error = %e,
                    "Primary store unavailable, deferring all operations to the secondary store"
                );
                Self::unavailable()
            }
            Err(panic) => {
                warn!(
                    panic_msg = %panic_message(panic.as_ref()),
                    "Primary store connection panicked, deferring to the secondary store"
                );
                Self::unavailable()
            }
        }
    }

    pub fn availability(&self) -> Availability {
        if self.store.is_some() {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    /// Merge `fields` into the profile; fields not mentioned are retained
    pub async fn upsert_account_profile(
        &self,
        account_id: &str,
        fields: &AccountProfile,
    ) -> Outcome<()> {
        self.guarded("upsert_account_profile", account_id, |store| async move {
            validate_account_id(account_id)?;
            store.merge_profile(account_id, fields).await
        })
        .await
    }

    pub async fn get_account_profile(&self, account_id: &str) -> Outcome<AccountProfile> {
        let outcome = self
            .guarded("get_account_profile", account_id, |store| async move {
                validate_account_id(account_id)?;
                store.get_profile(account_id).await
            })
            .await;

        match outcome {
            Outcome::Success(Some(profile)) => Outcome::Success(profile),
            Outcome::Success(None) => {
                debug!(account_id = %account_id, "Account profile not found");
                Outcome::NotFound
            }
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Failure(kind) => Outcome::Failure(kind),
            Outcome::Deferred => Outcome::Deferred,
        }
    }

    /// Store a new record; `profit` is kept exactly as supplied
    pub async fn create_job_record(
        &self,
        account_id: &str,
        record: &JobRecord,
    ) -> Outcome<RecordId> {
        self.guarded("create_job_record", account_id, |store| async move {
            validate_account_id(account_id)?;
            record.validate()?;

            let discrepancy = record.profit_discrepancy();
            if discrepancy.abs() > f64::EPSILON {
                debug!(
                    account_id = %account_id,
                    profit = record.profit,
                    expected_profit = record.expected_profit(),
                    "Caller-supplied profit differs from the cost breakdown"
                );
            }

            let record_id = store.insert_record(account_id, record).await?;
            debug!(account_id = %account_id, record_id = %record_id, "Job record created");
            Ok::<_, AppError>(record_id)
        })
        .await
    }

    /// All records of the account, each with its `record_id`. Order is unspecified.
    pub async fn list_job_records(&self, account_id: &str) -> Outcome<Vec<StoredJobRecord>> {
        self.guarded("list_job_records", account_id, |store| async move {
            validate_account_id(account_id)?;
            store.list_records(account_id).await
        })
        .await
    }

    /// Apply a sparse patch. A missing record yields `NotFound`.
    pub async fn update_job_record(
        &self,
        account_id: &str,
        record_id: &str,
        patch: &JobRecordPatch,
    ) -> Outcome<()> {
        self.guarded("update_job_record", account_id, |store| async move {
            validate_account_id(account_id)?;
            patch.validate()?;
            debug!(
                account_id = %account_id,
                record_id = %record_id,
                fields = ?patch.supplied_fields(),
                "Patching job record"
            );
            store.patch_record(account_id, record_id, patch).await
        })
        .await
    }

    /// Remove a record. Deleting an absent record yields `NotFound`.
    pub async fn delete_job_record(&self, account_id: &str, record_id: &str) -> Outcome<()> {
        self.guarded("delete_job_record", account_id, |store| async move {
            validate_account_id(account_id)?;
            store.delete_record(account_id, record_id).await
        })
        .await
    }

    /// Totals over the account's records (see [`JobSummary`])
    pub async fn summarize_job_records(&self, account_id: &str) -> Outcome<JobSummary> {
        self.list_job_records(account_id)
            .await
            .map(|records| summarize(&records))
    }

    /// Failure boundary shared by every operation
    async fn guarded<T, F, Fut>(
        &self,
        operation: &'static str,
        account_id: &str,
        call: F,
    ) -> Outcome<T>
    where
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(store) = self.store.clone() else {
            debug!(operation, account_id = %account_id, "Primary store unavailable, deferring");
            return Outcome::Deferred;
        };

        match AssertUnwindSafe(call(store)).catch_unwind().await {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(AppError::NotFound(what))) => {
                debug!(operation, account_id = %account_id, what = %what, "Not found");
                Outcome::NotFound
            }
            Ok(Err(e)) => {
                let kind = FailureKind::from(&e);
                if kind == FailureKind::Rejected {
                    warn!(operation, account_id = %account_id, error = %e, "Request rejected");
                } else {
                    error!(
                        operation,
                        account_id = %account_id,
                        error = %e,
                        "Primary store operation failed"
                    );
                }
                Outcome::Failure(kind)
            }
            Err(panic) => {
                error!(
                    operation,
                    account_id = %account_id,
                    panic_msg = %panic_message(panic.as_ref()),
                    "Primary store operation panicked"
                );
                Outcome::Failure(FailureKind::Internal)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
