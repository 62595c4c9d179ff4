// Document Store Port (primary store interface)

use crate::domain::{AccountProfile, JobRecord, JobRecordPatch, RecordId, StoredJobRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Account-scoped document store the gateway talks to.
///
/// Implementations must be safe for concurrent use; the gateway adds no
/// locking of its own. Missing records are reported as `AppError::NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Merge `fields` into the account profile, creating it if absent
    async fn merge_profile(&self, account_id: &str, fields: &AccountProfile) -> Result<()>;

    /// Full profile, or `None` when the account has never been written
    async fn get_profile(&self, account_id: &str) -> Result<Option<AccountProfile>>;

    /// Insert a record under the account and return the assigned id
    async fn insert_record(&self, account_id: &str, record: &JobRecord) -> Result<RecordId>;

    /// All records of the account (order unspecified)
    async fn list_records(&self, account_id: &str) -> Result<Vec<StoredJobRecord>>;

    /// Write only the supplied fields of `patch`
    async fn patch_record(
        &self,
        account_id: &str,
        record_id: &str,
        patch: &JobRecordPatch,
    ) -> Result<()>;

    async fn delete_record(&self, account_id: &str, record_id: &str) -> Result<()>;
}
