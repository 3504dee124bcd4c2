//! Derived financial risk indicators.
//!
//! Pure functions over already-numeric fields. The parser applies them once per
//! snapshot after the raw fields are populated; [`recompute_table`] applies the
//! decimal forms independently over a finished table as a cross-check. Neither
//! path ever touches the locale text conversion.

use crate::snapshot::FinancialSnapshot;

/// A ratio in both the percentage (0-100) and decimal (0-1) form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RatioPair {
    /// Percentage form.
    pub percentage: f64,
    /// Decimal form.
    pub decimal: f64,
}

/// Consolidates the two independently reported delinquency measurements.
///
/// The filing reports the same exposure under two classification schemes;
/// taking the larger of the two avoids double-counting it. Fixed business
/// rule, not a sum.
#[must_use]
pub fn consolidated_delinquency(credit_delinquency: f64, receivables_delinquency: f64) -> f64 {
    credit_delinquency.max(receivables_delinquency)
}

/// Non-performing-loan ratio of the gross credit portfolio.
///
/// Zero unless both the portfolio and the consolidated delinquency are
/// positive. The decimal form is clamped to `1.0`: malformed filings can
/// report delinquency orders of magnitude above the portfolio.
#[must_use]
pub fn npl_ratio(consolidated_delinquency: f64, acquired_receivables: f64) -> RatioPair {
    if acquired_receivables > 0.0 && consolidated_delinquency > 0.0 {
        let percentage = consolidated_delinquency / acquired_receivables * 100.0;
        RatioPair {
            percentage,
            decimal: (percentage / 100.0).min(1.0),
        }
    } else {
        RatioPair::default()
    }
}

/// Immediate liquidity: available funds over total assets. Unclamped.
#[must_use]
pub fn liquidity_ratio(available_funds: f64, total_assets: f64) -> RatioPair {
    ratio_of(available_funds, total_assets)
}

/// Credit concentration: acquired receivables over total assets. Unclamped.
#[must_use]
pub fn concentration_ratio(acquired_receivables: f64, total_assets: f64) -> RatioPair {
    ratio_of(acquired_receivables, total_assets)
}

fn ratio_of(numerator: f64, total_assets: f64) -> RatioPair {
    if total_assets > 0.0 {
        let percentage = numerator / total_assets * 100.0;
        RatioPair {
            percentage,
            decimal: percentage / 100.0,
        }
    } else {
        RatioPair::default()
    }
}

/// Indicators recomputed over one row of a finished table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TableIndicators {
    /// Liquidity in decimal form, zero when total assets are zero.
    pub liquidity: f64,
    /// NPL in decimal form, zero when the gross portfolio is zero.
    pub npl: f64,
    /// Net portfolio: acquired receivables plus total credit rights.
    pub net_portfolio: f64,
}

/// Recomputes the decimal-form indicators over a bulk table.
///
/// Works directly on the snapshots' machine floats, independent of the
/// per-snapshot derivation done at parse time, so divergence between the two
/// points at a parsing defect.
#[must_use]
pub fn recompute_table(snapshots: &[FinancialSnapshot]) -> Vec<TableIndicators> {
    snapshots
        .iter()
        .map(|s| TableIndicators {
            liquidity: if s.total_assets == 0.0 {
                0.0
            } else {
                s.available_funds / s.total_assets
            },
            npl: if s.gross_portfolio == 0.0 {
                0.0
            } else {
                s.consolidated_delinquency / s.gross_portfolio
            },
            net_portfolio: s.acquired_receivables + s.receivables_total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consolidation_takes_the_larger_measurement() {
        assert_eq!(consolidated_delinquency(50.0, 30.0), 50.0);
        assert_eq!(consolidated_delinquency(30.0, 50.0), 50.0);
        assert_eq!(consolidated_delinquency(0.0, 0.0), 0.0);
    }

    #[test]
    fn npl_happy_path() {
        let npl = npl_ratio(40_000.0, 800_000.0);
        assert!((npl.percentage - 5.0).abs() < 1e-12);
        assert!((npl.decimal - 0.05).abs() < 1e-12);
    }

    #[test]
    fn npl_decimal_is_clamped() {
        // Malformed filing: delinquency vastly above the portfolio, the
        // percentage blows up but the decimal form stays within [0, 1].
        let npl = npl_ratio(31_000_000_000.0, 100.0);
        assert!(npl.percentage > 1e9);
        assert_eq!(npl.decimal, 1.0);
    }

    #[test]
    fn npl_zero_without_portfolio_or_delinquency() {
        assert_eq!(npl_ratio(0.0, 800_000.0), RatioPair::default());
        assert_eq!(npl_ratio(40_000.0, 0.0), RatioPair::default());
    }

    #[test]
    fn liquidity_and_concentration_are_unclamped() {
        let liquidity = liquidity_ratio(50_000.0, 1_000_000.0);
        assert!((liquidity.percentage - 5.0).abs() < 1e-12);
        assert!((liquidity.decimal - 0.05).abs() < 1e-12);

        // A fund can report receivables above its total assets.
        let concentration = concentration_ratio(2_000_000.0, 1_000_000.0);
        assert!((concentration.percentage - 200.0).abs() < 1e-12);
        assert!((concentration.decimal - 2.0).abs() < 1e-12);

        assert_eq!(liquidity_ratio(50_000.0, 0.0), RatioPair::default());
    }

    #[test]
    fn table_recompute_matches_parse_time_derivation() {
        let snapshot = FinancialSnapshot {
            total_assets: 1_000_000.0,
            available_funds: 50_000.0,
            acquired_receivables: 800_000.0,
            gross_portfolio: 800_000.0,
            receivables_total: 200_000.0,
            consolidated_delinquency: 40_000.0,
            ..Default::default()
        };
        let rows = recompute_table(std::slice::from_ref(&snapshot));
        assert_eq!(rows.len(), 1);
        assert!((rows[0].liquidity - 0.05).abs() < 1e-12);
        assert!((rows[0].npl - 0.05).abs() < 1e-12);
        assert_eq!(rows[0].net_portfolio, 1_000_000.0);
    }

    #[test]
    fn tiny_machine_float_survives_recompute() {
        // 0.01 delinquency over a 31.7M portfolio: a ratio near 3.15e-10 must
        // come out of the bulk pass numerically intact.
        let snapshot = FinancialSnapshot {
            gross_portfolio: 31_740_113.80,
            consolidated_delinquency: 0.01,
            ..Default::default()
        };
        let rows = recompute_table(std::slice::from_ref(&snapshot));
        let expected = 0.01 / 31_740_113.80;
        assert_eq!(rows[0].npl, expected);
        assert!(rows[0].npl < 1e-9);
    }
}
