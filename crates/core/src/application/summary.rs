// Job Summary - dashboard totals over an account's records

use crate::domain::{Money, StoredJobRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals over a set of job records.
///
/// `total_profit` adds up the stored, caller-supplied `profit` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSummary {
    pub record_count: usize,
    pub total_gross: Money,
    pub total_fees: Money,
    pub total_fee_offsets: Money,
    pub total_costs: Money,
    pub total_profit: Money,
    /// Rounded to whole units, 0 for an empty set
    pub average_profit: Money,
    /// Record count per client name
    pub clients: BTreeMap<String, usize>,
}

pub fn summarize(records: &[StoredJobRecord]) -> JobSummary {
    let mut summary = JobSummary {
        record_count: records.len(),
        ..Default::default()
    };

    for stored in records {
        let r = &stored.record;
        summary.total_gross += r.gross_amount;
        summary.total_fees += r.fee;
        summary.total_fee_offsets += r.fee_offset;
        summary.total_costs += r.total_costs();
        summary.total_profit += r.profit;
        *summary.clients.entry(r.client_name.clone()).or_insert(0) += 1;
    }

    if summary.record_count > 0 {
        summary.average_profit = (summary.total_profit / summary.record_count as f64).round();
    }

    summary
}
