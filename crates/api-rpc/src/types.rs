//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use jobledger_core::application::{Availability, JobSummary};
use jobledger_core::domain::{AccountProfile, JobRecord, JobRecordPatch, StoredJobRecord};
use jobledger_core::Source;
use serde::{Deserialize, Serialize};

/// records.list.v1, records.summary.v1, profile.get.v1
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRecordsResponse {
    pub source: Source,
    pub records: Vec<StoredJobRecord>,
}

/// records.create.v1
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub account_id: String,
    pub record: JobRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRecordResponse {
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// records.update.v1
#[derive(Debug, Deserialize)]
pub struct UpdateRecordRequest {
    pub account_id: String,
    pub record_id: String,
    pub patch: JobRecordPatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecordResponse {
    pub source: Source,
    pub updated: bool,
}

/// records.delete.v1
#[derive(Debug, Deserialize)]
pub struct DeleteRecordRequest {
    pub account_id: String,
    pub record_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecordResponse {
    pub source: Source,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<AccountProfile>,
}

/// profile.upsert.v1
#[derive(Debug, Deserialize)]
pub struct UpsertProfileRequest {
    pub account_id: String,
    pub fields: AccountProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertProfileResponse {
    pub source: Source,
    pub saved: bool,
}

/// system.status.v1 (no parameters)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub primary: Availability,
    pub uptime_seconds: i64,
}
