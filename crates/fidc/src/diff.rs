//! Field-level diff between two snapshot tables.
//!
//! Compares the numeric columns of two runs, keyed by fund identifier. Only
//! identifiers present in both tables are compared, and only real changes are
//! reported.

use std::collections::HashMap;
use tracing::debug;

use fidc_core::{FinancialSnapshot, FundId};

/// One changed numeric field between two runs.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffRecord {
    /// Fund the change belongs to.
    pub fund_id: FundId,
    /// Column name, as exported.
    pub column: &'static str,
    /// Value in the earlier table.
    pub previous: f64,
    /// Value in the later table.
    pub current: f64,
    /// Signed change; a missing side contributes zero.
    pub delta: f64,
}

/// Diffs two tables over the numeric columns.
///
/// Missing values (NaN) follow signed-change semantics: both sides missing
/// means no comparison, one side missing means the present value is the whole
/// delta, signed by which side it is on. Zero deltas are omitted, so an empty
/// result means the common identifiers are numerically identical.
#[must_use]
pub fn diff_tables(previous: &[FinancialSnapshot], current: &[FinancialSnapshot]) -> Vec<DiffRecord> {
    let current_by_id: HashMap<&FundId, &FinancialSnapshot> =
        current.iter().map(|s| (&s.fund_id, s)).collect();

    let mut records = Vec::new();
    for earlier in previous {
        let Some(later) = current_by_id.get(&earlier.fund_id) else {
            continue;
        };
        for ((column, p), (_, c)) in earlier
            .numeric_entries()
            .into_iter()
            .zip(later.numeric_entries())
        {
            let delta = match (p.is_nan(), c.is_nan()) {
                (true, true) => continue,
                (true, false) => c,
                (false, true) => -p,
                (false, false) => c - p,
            };
            if delta == 0.0 {
                continue;
            }
            records.push(DiffRecord {
                fund_id: earlier.fund_id.clone(),
                column,
                previous: p,
                current: c,
                delta,
            });
        }
    }
    debug!(changes = records.len(), "Tables diffed");
    records
}
