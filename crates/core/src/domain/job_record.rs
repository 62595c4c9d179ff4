// Job Record Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Record ID (assigned by the primary store on insert, opaque to the core)
pub type RecordId = String;

/// Monetary amount in the account's currency
pub type Money = f64;

/// One unit of billable work performed for a client.
///
/// `profit` is stored exactly as the caller supplied it. The core never
/// recomputes it from the other amounts; see [`JobRecord::expected_profit`]
/// for a read-only comparison value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Calendar date as typed by the user ("15. 1. 2025", "2025-01-15", ...)
    pub date: String,
    pub kind: String,
    pub client_name: String,
    /// External job number, may be empty
    #[serde(default)]
    pub external_reference: String,

    pub gross_amount: Money,
    pub fee: Money,
    pub fee_offset: Money,
    pub fuel_cost: Money,
    pub material_cost: Money,
    pub helper_cost: Money,
    pub profit: Money,

    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub attachment_refs: Vec<String>,
}

impl JobRecord {
    fn amounts(&self) -> [(&'static str, Money); 7] {
        [
            ("gross_amount", self.gross_amount),
            ("fee", self.fee),
            ("fee_offset", self.fee_offset),
            ("fuel_cost", self.fuel_cost),
            ("material_cost", self.material_cost),
            ("helper_cost", self.helper_cost),
            ("profit", self.profit),
        ]
    }

    /// Check the creation payload.
    ///
    /// Dates and free-text fields pass through untouched.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.amounts() {
            check_amount(field, value)?;
        }
        if let Some(days) = self.duration_days {
            check_duration(days)?;
        }
        check_attachment_refs(&self.attachment_refs)
    }

    /// Sum of the cost components (fuel, material, helper).
    pub fn total_costs(&self) -> Money {
        self.fuel_cost + self.material_cost + self.helper_cost
    }

    /// `gross_amount - fee - fuel_cost - material_cost - helper_cost`.
    ///
    /// Informational only; never written back over `profit`.
    pub fn expected_profit(&self) -> Money {
        self.gross_amount - self.fee - self.total_costs()
    }

    /// Difference between the stored profit and [`Self::expected_profit`].
    pub fn profit_discrepancy(&self) -> Money {
        self.profit - self.expected_profit()
    }

    /// Apply a sparse patch in place. Only supplied fields change.
    pub fn apply(&mut self, patch: &JobRecordPatch) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut self.date, &patch.date);
        set(&mut self.kind, &patch.kind);
        set(&mut self.client_name, &patch.client_name);
        set(&mut self.external_reference, &patch.external_reference);
        set(&mut self.gross_amount, &patch.gross_amount);
        set(&mut self.fee, &patch.fee);
        set(&mut self.fee_offset, &patch.fee_offset);
        set(&mut self.fuel_cost, &patch.fuel_cost);
        set(&mut self.material_cost, &patch.material_cost);
        set(&mut self.helper_cost, &patch.helper_cost);
        set(&mut self.profit, &patch.profit);
        set(&mut self.address, &patch.address);
        set(&mut self.phone, &patch.phone);
        set(&mut self.notes, &patch.notes);
        set(&mut self.attachment_refs, &patch.attachment_refs);
        if patch.duration_days.is_some() {
            self.duration_days = patch.duration_days;
        }
    }
}

/// Partial update of a [`JobRecord`].
///
/// `None` means "not supplied" and is skipped on serialization, so the
/// serialized patch only carries the fields present in the request. A
/// supplied falsy value (`0`, `""`, `[]`) is still `Some` and gets written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_offset: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_refs: Option<Vec<String>>,
}

impl JobRecordPatch {
    /// Names of the supplied fields, in declaration order
    pub fn supplied_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("date", self.date.is_some()),
            ("kind", self.kind.is_some()),
            ("client_name", self.client_name.is_some()),
            ("external_reference", self.external_reference.is_some()),
            ("gross_amount", self.gross_amount.is_some()),
            ("fee", self.fee.is_some()),
            ("fee_offset", self.fee_offset.is_some()),
            ("fuel_cost", self.fuel_cost.is_some()),
            ("material_cost", self.material_cost.is_some()),
            ("helper_cost", self.helper_cost.is_some()),
            ("profit", self.profit.is_some()),
            ("address", self.address.is_some()),
            ("phone", self.phone.is_some()),
            ("duration_days", self.duration_days.is_some()),
            ("notes", self.notes.is_some()),
            ("attachment_refs", self.attachment_refs.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let amounts = [
            ("gross_amount", self.gross_amount),
            ("fee", self.fee),
            ("fee_offset", self.fee_offset),
            ("fuel_cost", self.fuel_cost),
            ("material_cost", self.material_cost),
            ("helper_cost", self.helper_cost),
            ("profit", self.profit),
        ];
        for (field, value) in amounts {
            if let Some(v) = value {
                check_amount(field, v)?;
            }
        }
        if let Some(days) = self.duration_days {
            check_duration(days)?;
        }
        if let Some(refs) = &self.attachment_refs {
            check_attachment_refs(refs)?;
        }
        Ok(())
    }
}

/// A stored record: its fields plus the store-assigned `record_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredJobRecord {
    pub record_id: RecordId,
    #[serde(flatten)]
    pub record: JobRecord,
}

fn check_amount(field: &'static str, value: Money) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DomainError::NonFiniteAmount { field, value })
    }
}

fn check_duration(days: i64) -> Result<()> {
    if days < 0 {
        return Err(DomainError::NegativeDuration(days));
    }
    Ok(())
}

fn check_attachment_refs(refs: &[String]) -> Result<()> {
    match refs.iter().position(|r| r.trim().is_empty()) {
        Some(idx) => Err(DomainError::EmptyAttachmentRef(idx)),
        None => Ok(()),
    }
}
