// SQLite DocumentStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use jobledger_core::domain::{
    AccountProfile, JobRecord, JobRecordPatch, RecordId, StoredJobRecord,
};
use jobledger_core::error::{AppError, Result};
use jobledger_core::port::{DocumentStore, IdProvider, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Primary store backed by SQLite JSON documents.
///
/// Profiles and job record fields live in TEXT columns holding serde_json
/// output. Merge writes and sparse patches read, modify and write the
/// document inside one transaction.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteDocumentStore {
    pub fn new(
        pool: SqlitePool,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            id_provider,
            time_provider,
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn merge_profile(&self, account_id: &str, fields: &AccountProfile) -> Result<()> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Writing first takes the write lock before the profile is read
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, profile, created_at, updated_at)
            VALUES (?, '{}', ?, ?)
            ON CONFLICT(account_id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(account_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let stored: String =
            sqlx::query_scalar("SELECT profile FROM accounts WHERE account_id = ?")
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let mut profile: AccountProfile = serde_json::from_str(&stored).map_err(|e| {
            AppError::Database(format!("Malformed profile of account {}: {}", account_id, e))
        })?;
        profile.merge(fields);

        sqlx::query("UPDATE accounts SET profile = ? WHERE account_id = ?")
            .bind(serde_json::to_string(&profile)?)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_profile(&self, account_id: &str) -> Result<Option<AccountProfile>> {
        let profile: Option<String> =
            sqlx::query_scalar("SELECT profile FROM accounts WHERE account_id = ?")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        profile
            .map(|json| serde_json::from_str(&json).map_err(AppError::from))
            .transpose()
    }

    async fn insert_record(&self, account_id: &str, record: &JobRecord) -> Result<RecordId> {
        let record_id = self.id_provider.generate_id();
        let now = self.time_provider.now_millis();
        // Stored verbatim so amounts read back bit-for-bit
        let fields_json = serde_json::to_string(record)?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Parent account comes into existence with the first write
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, profile, created_at, updated_at)
            VALUES (?, '{}', ?, ?)
            ON CONFLICT(account_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO job_records (record_id, account_id, fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record_id)
        .bind(account_id)
        .bind(&fields_json)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(record_id)
    }

    async fn list_records(&self, account_id: &str) -> Result<Vec<StoredJobRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT record_id, fields FROM job_records
            WHERE account_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RecordRow::into_stored).collect()
    }

    async fn patch_record(
        &self,
        account_id: &str,
        record_id: &str,
        patch: &JobRecordPatch,
    ) -> Result<()> {
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Touching the row first takes the write lock and proves the record exists
        let touched = sqlx::query(
            "UPDATE job_records SET updated_at = ? WHERE account_id = ? AND record_id = ?",
        )
        .bind(now)
        .bind(account_id)
        .bind(record_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if touched.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Job record {} of account {}",
                record_id, account_id
            )));
        }

        let row: RecordRow = sqlx::query_as(
            "SELECT record_id, fields FROM job_records WHERE account_id = ? AND record_id = ?",
        )
        .bind(account_id)
        .bind(record_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut stored = row.into_stored()?;
        stored.record.apply(patch);

        sqlx::query("UPDATE job_records SET fields = ? WHERE record_id = ?")
            .bind(serde_json::to_string(&stored.record)?)
            .bind(record_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(account_id = %account_id, record_id = %record_id, "Job record patched");
        Ok(())
    }

    async fn delete_record(&self, account_id: &str, record_id: &str) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM job_records WHERE account_id = ? AND record_id = ?")
                .bind(account_id)
                .bind(record_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Job record {} of account {}",
                record_id, account_id
            )));
        }

        Ok(())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    record_id: String,
    fields: String,
}

impl RecordRow {
    fn into_stored(self) -> Result<StoredJobRecord> {
        let record: JobRecord = serde_json::from_str(&self.fields).map_err(|e| {
            AppError::Database(format!("Malformed job record {}: {}", self.record_id, e))
        })?;
        Ok(StoredJobRecord {
            record_id: self.record_id,
            record,
        })
    }
}
