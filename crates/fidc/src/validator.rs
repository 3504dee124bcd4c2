//! Quality flags over a finished snapshot table.
//!
//! Flags are derived annotations: computing them never mutates the snapshots,
//! and recomputing them over the same table yields the same flags.

use tracing::debug;

use fidc_core::{FinancialSnapshot, ValidationFlags};

/// Computes the quality flags for one snapshot.
///
/// Failed snapshots are left unflagged; their zeros are an artifact of the
/// failure, not a reported position.
#[must_use]
pub fn validate(snapshot: &FinancialSnapshot) -> ValidationFlags {
    if !snapshot.is_success() {
        return ValidationFlags::default();
    }
    ValidationFlags {
        zero_assets: snapshot.total_assets == 0.0,
        zero_gross_portfolio_with_delinquency: snapshot.gross_portfolio == 0.0
            && snapshot.consolidated_delinquency > 0.0,
        no_position: snapshot.total_portfolio == 0.0 && snapshot.total_assets > 0.0,
    }
}

/// Computes the flags for a whole table, row-aligned with the input.
#[must_use]
pub fn validate_all(table: &[FinancialSnapshot]) -> Vec<ValidationFlags> {
    let flags: Vec<ValidationFlags> = table.iter().map(validate).collect();
    let flagged = flags.iter().filter(|f| f.has_issues()).count();
    debug!(rows = table.len(), flagged, "Quality flags computed");
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use fidc_core::{FundId, ProcessingStatus};

    #[test]
    fn clean_snapshot_raises_nothing() {
        let snapshot = FinancialSnapshot {
            total_assets: 1_000_000.0,
            total_portfolio: 950_000.0,
            gross_portfolio: 800_000.0,
            consolidated_delinquency: 40_000.0,
            ..Default::default()
        };
        assert!(!validate(&snapshot).has_issues());
    }

    #[test]
    fn zero_assets_is_flagged() {
        let snapshot = FinancialSnapshot {
            total_assets: 0.0,
            ..Default::default()
        };
        let flags = validate(&snapshot);
        assert!(flags.zero_assets);
        assert!(!flags.no_position);
    }

    #[test]
    fn delinquency_against_empty_portfolio_is_flagged() {
        let snapshot = FinancialSnapshot {
            total_assets: 1_000_000.0,
            total_portfolio: 900_000.0,
            gross_portfolio: 0.0,
            consolidated_delinquency: 12_345.0,
            ..Default::default()
        };
        let flags = validate(&snapshot);
        assert!(flags.zero_gross_portfolio_with_delinquency);
        assert!(!flags.zero_assets);
    }

    #[test]
    fn assets_without_portfolio_is_flagged() {
        let snapshot = FinancialSnapshot {
            total_assets: 500_000.0,
            total_portfolio: 0.0,
            ..Default::default()
        };
        assert!(validate(&snapshot).no_position);
    }

    #[test]
    fn failed_snapshots_stay_unflagged() {
        let snapshot = FinancialSnapshot::failed(
            FundId::new("1"),
            ProcessingStatus::DownloadError,
            "HTTP 503",
        );
        assert!(!validate(&snapshot).has_issues());
    }

    #[test]
    fn validation_is_idempotent() {
        let snapshot = FinancialSnapshot {
            total_assets: 500_000.0,
            ..Default::default()
        };
        assert_eq!(validate(&snapshot), validate(&snapshot));
        let table = vec![snapshot];
        assert_eq!(validate_all(&table), validate_all(&table));
    }
}
