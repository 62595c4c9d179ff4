// Domain Layer - Job records and account profiles

pub mod account;
pub mod error;
pub mod job_record;

// Re-exports
pub use account::{validate_account_id, AccountId, AccountProfile, ProfileValue};
pub use error::DomainError;
pub use job_record::{JobRecord, JobRecordPatch, Money, RecordId, StoredJobRecord};
