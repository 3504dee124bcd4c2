//! The parsed filing record.
//!
//! [`FinancialSnapshot`] holds every field extracted from one fund's monthly
//! filing plus the derived risk indicators and processing metadata. Records are
//! immutable once produced by the parser; the validator and diff generator only
//! read them.

use serde::{Deserialize, Serialize};

use crate::error::ProcessingStatus;
use crate::types::{FieldValue, FundId};

/// One fund's parsed monthly filing for one reference period.
///
/// Identification fields are strings defaulting to `""`; monetary and quantity
/// fields are floats defaulting to `0.0`. Invariants: the fund identifier is
/// always 14 numeric digits, and for every ratio pair the decimal form equals
/// the percentage form divided by 100, except the NPL decimal which is clamped
/// to at most `1.0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    // Identification
    /// Fund identifier, normalized to 14 digits.
    pub fund_id: FundId,
    /// Administrator identifier as reported in the filing.
    pub administrator_id: String,
    /// Competence period of the filing.
    pub reference_period: String,
    /// Condominium type (open/closed).
    pub condominium_type: String,
    /// Exclusive-fund flag.
    pub exclusive_fund: String,
    /// Single-class flag.
    pub single_class: String,
    /// Linked-quotaholder flag.
    pub linked_quotaholder: String,

    // General assets
    /// Total assets of the fund.
    pub total_assets: f64,
    /// Immediately available funds (cash and equivalents).
    pub available_funds: f64,
    /// Total portfolio value.
    pub total_portfolio: f64,
    /// Other assets, total.
    pub other_assets_total: f64,
    /// Other assets, short-term receivables.
    pub other_assets_short_term: f64,
    /// Other assets, long-term receivables.
    pub other_assets_long_term: f64,

    // Existing credits
    /// Acquired receivables (the gross credit portfolio used for NPL).
    pub acquired_receivables: f64,
    /// Overdue but performing credits.
    pub credit_overdue_performing: f64,
    /// Overdue delinquent credits.
    pub credit_overdue_delinquent: f64,
    /// Total overdue of delinquent debtors.
    pub credit_total_overdue_delinquent: f64,
    /// Delinquency reported under the existing-credits scheme.
    pub credit_delinquency: f64,
    /// Performed credits.
    pub credit_performed: f64,
    /// Overdue credits pending settlement.
    pub credit_overdue_pending: f64,
    /// Credits originated from companies in judicial recovery.
    pub credit_recovery_origin: f64,
    /// Credits backed by public revenue.
    pub credit_public_revenue: f64,
    /// Credits under court action.
    pub credit_court_action: f64,
    /// Credits whose legal constitution is a risk factor.
    pub credit_legal_risk: f64,
    /// Provision for losses and recovery reductions.
    pub credit_loss_provision: f64,

    // Credit rights (receivables scheme)
    /// Credit rights, total.
    pub receivables_total: f64,
    /// Credit rights retained by the assignor.
    pub receivables_assignor: f64,
    /// Overdue delinquent credit rights.
    pub receivables_overdue_delinquent: f64,
    /// Total overdue of delinquent credit-rights debtors.
    pub receivables_total_overdue_delinquent: f64,
    /// Delinquency reported under the credit-rights scheme.
    pub receivables_delinquency: f64,
    /// Performed credit rights.
    pub receivables_performed: f64,
    /// Overdue credit rights pending settlement.
    pub receivables_overdue_pending: f64,
    /// Credit rights originated from companies in judicial recovery.
    pub receivables_recovery_origin: f64,
    /// Credit rights backed by public revenue.
    pub receivables_public_revenue: f64,
    /// Credit rights under court action.
    pub receivables_court_action: f64,
    /// Provision for credit-rights losses.
    pub receivables_loss_provision: f64,

    // Securities
    /// Securities, total.
    pub securities_total: f64,
    /// Debentures.
    pub debentures: f64,
    /// Real-estate receivable certificates.
    pub real_estate_certificates: f64,
    /// Commercial promissory notes.
    pub commercial_notes: f64,
    /// Financial bills.
    pub financial_bills: f64,
    /// Investment-fund quotas.
    pub fif_quotas: f64,
    /// Other credit-right securities.
    pub other_credit_securities: f64,

    // Other financial assets
    /// Federal government bonds.
    pub federal_bonds: f64,
    /// Bank deposit certificates.
    pub bank_certificates: f64,
    /// Repurchase-agreement investments.
    pub repo_operations: f64,
    /// Fixed-income financial assets.
    pub fixed_income_assets: f64,
    /// Quotas of other structured-credit funds.
    pub fidc_quotas: f64,

    // Derivatives
    /// Derivatives market, total.
    pub derivatives_total: f64,
    /// Forward market, long positions.
    pub forward_long_position: f64,
    /// Options market, holder positions.
    pub options_holder_position: f64,
    /// Futures market, positive adjustments.
    pub futures_positive_adjustment: f64,
    /// Swap differentials receivable.
    pub swap_receivable: f64,
    /// Coverage provided.
    pub coverage_provided: f64,
    /// Margin deposits.
    pub margin_deposits: f64,

    // Portfolio segmentation
    /// Segmented portfolio, total.
    pub segmented_portfolio_total: f64,
    /// Industrial segment.
    pub segment_industrial: f64,
    /// Real-estate market segment.
    pub segment_real_estate: f64,
    /// Agribusiness segment.
    pub segment_agribusiness: f64,
    /// Credit-card segment.
    pub segment_credit_card: f64,
    /// Court-action segment.
    pub segment_court_action: f64,
    /// Trademarks-and-patents segment.
    pub segment_intellectual_property: f64,
    /// Commercial segment, total.
    pub segment_commercial_total: f64,
    /// Commerce.
    pub segment_commerce: f64,
    /// Retail commerce.
    pub segment_retail: f64,
    /// Commercial leasing.
    pub segment_leasing: f64,
    /// Services segment, total.
    pub segment_services_total: f64,
    /// General services.
    pub segment_services: f64,
    /// Public services.
    pub segment_public_services: f64,
    /// Education services.
    pub segment_education_services: f64,
    /// Entertainment services.
    pub segment_entertainment_services: f64,
    /// Financial segment, total.
    pub segment_financial_total: f64,
    /// Personal credit.
    pub segment_personal_credit: f64,
    /// Payroll-deducted personal credit.
    pub segment_payroll_credit: f64,
    /// Corporate credit.
    pub segment_corporate_credit: f64,
    /// Middle-market credit.
    pub segment_middle_market: f64,
    /// Vehicle financing.
    pub segment_vehicle_credit: f64,
    /// Corporate real-estate financing.
    pub segment_corporate_real_estate: f64,
    /// Residential real-estate financing.
    pub segment_residential_real_estate: f64,
    /// Other financial-segment credit.
    pub segment_financial_other: f64,
    /// Factoring segment, total.
    pub segment_factoring_total: f64,
    /// Personal factoring.
    pub segment_factoring_personal: f64,
    /// Corporate factoring.
    pub segment_factoring_corporate: f64,
    /// Public-sector segment, total.
    pub segment_public_sector_total: f64,
    /// Court-ordered government debt.
    pub segment_court_ordered_debt: f64,
    /// Tax credits.
    pub segment_tax_credits: f64,
    /// Royalties.
    pub segment_royalties: f64,
    /// Other public-sector credit.
    pub segment_public_sector_other: f64,

    // Derived indicators
    /// Consolidated delinquency: the larger of the two reported schemes.
    pub consolidated_delinquency: f64,
    /// Gross credit portfolio (alias of acquired receivables).
    pub gross_portfolio: f64,
    /// NPL ratio, percentage form (0-100, unclamped).
    pub npl_ratio_pct: f64,
    /// NPL ratio, decimal form, clamped to at most 1.0.
    pub npl_ratio: f64,
    /// Immediate liquidity ratio, percentage form.
    pub liquidity_ratio_pct: f64,
    /// Immediate liquidity ratio, decimal form.
    pub liquidity_ratio: f64,
    /// Credit concentration ratio, percentage form.
    pub concentration_ratio_pct: f64,
    /// Credit concentration ratio, decimal form.
    pub concentration_ratio: f64,

    // Processing metadata
    /// Outcome of processing this identifier.
    pub status: ProcessingStatus,
    /// Human-readable failure message, present only when status is not success.
    pub error_message: Option<String>,
    /// Registry id of the parsed document.
    pub document_id: String,
    /// Reference period reported by the registry for the document.
    pub document_reference_date: String,
}

impl FinancialSnapshot {
    /// Builds the record for an identifier whose processing failed.
    ///
    /// All financial fields stay at their defaults; only the identifier and
    /// the failure metadata are filled in.
    #[must_use]
    pub fn failed(fund_id: FundId, status: ProcessingStatus, message: impl Into<String>) -> Self {
        Self {
            fund_id,
            status,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether this record came out of a fully successful pipeline run.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ProcessingStatus::Success)
    }

    /// The textual fields, in column order, as `(COLUMN, value)` pairs.
    #[must_use]
    pub fn text_entries(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("FUND_ID", FieldValue::Text(self.fund_id.to_string())),
            (
                "ADMINISTRATOR_ID",
                FieldValue::Text(self.administrator_id.clone()),
            ),
            (
                "REFERENCE_PERIOD",
                FieldValue::Text(self.reference_period.clone()),
            ),
            (
                "CONDOMINIUM_TYPE",
                FieldValue::Text(self.condominium_type.clone()),
            ),
            (
                "EXCLUSIVE_FUND",
                FieldValue::Text(self.exclusive_fund.clone()),
            ),
            ("SINGLE_CLASS", FieldValue::Text(self.single_class.clone())),
            (
                "LINKED_QUOTAHOLDER",
                FieldValue::Text(self.linked_quotaholder.clone()),
            ),
        ]
    }

    /// The numeric fields, in column order, as `(COLUMN, value)` pairs.
    ///
    /// This is the single source of truth for which columns the diff generator
    /// compares and the exporter formats.
    #[must_use]
    pub fn numeric_entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("TOTAL_ASSETS", self.total_assets),
            ("AVAILABLE_FUNDS", self.available_funds),
            ("TOTAL_PORTFOLIO", self.total_portfolio),
            ("OTHER_ASSETS_TOTAL", self.other_assets_total),
            ("OTHER_ASSETS_SHORT_TERM", self.other_assets_short_term),
            ("OTHER_ASSETS_LONG_TERM", self.other_assets_long_term),
            ("ACQUIRED_RECEIVABLES", self.acquired_receivables),
            ("CREDIT_OVERDUE_PERFORMING", self.credit_overdue_performing),
            ("CREDIT_OVERDUE_DELINQUENT", self.credit_overdue_delinquent),
            (
                "CREDIT_TOTAL_OVERDUE_DELINQUENT",
                self.credit_total_overdue_delinquent,
            ),
            ("CREDIT_DELINQUENCY", self.credit_delinquency),
            ("CREDIT_PERFORMED", self.credit_performed),
            ("CREDIT_OVERDUE_PENDING", self.credit_overdue_pending),
            ("CREDIT_RECOVERY_ORIGIN", self.credit_recovery_origin),
            ("CREDIT_PUBLIC_REVENUE", self.credit_public_revenue),
            ("CREDIT_COURT_ACTION", self.credit_court_action),
            ("CREDIT_LEGAL_RISK", self.credit_legal_risk),
            ("CREDIT_LOSS_PROVISION", self.credit_loss_provision),
            ("RECEIVABLES_TOTAL", self.receivables_total),
            ("RECEIVABLES_ASSIGNOR", self.receivables_assignor),
            (
                "RECEIVABLES_OVERDUE_DELINQUENT",
                self.receivables_overdue_delinquent,
            ),
            (
                "RECEIVABLES_TOTAL_OVERDUE_DELINQUENT",
                self.receivables_total_overdue_delinquent,
            ),
            ("RECEIVABLES_DELINQUENCY", self.receivables_delinquency),
            ("RECEIVABLES_PERFORMED", self.receivables_performed),
            (
                "RECEIVABLES_OVERDUE_PENDING",
                self.receivables_overdue_pending,
            ),
            (
                "RECEIVABLES_RECOVERY_ORIGIN",
                self.receivables_recovery_origin,
            ),
            (
                "RECEIVABLES_PUBLIC_REVENUE",
                self.receivables_public_revenue,
            ),
            ("RECEIVABLES_COURT_ACTION", self.receivables_court_action),
            (
                "RECEIVABLES_LOSS_PROVISION",
                self.receivables_loss_provision,
            ),
            ("SECURITIES_TOTAL", self.securities_total),
            ("DEBENTURES", self.debentures),
            ("REAL_ESTATE_CERTIFICATES", self.real_estate_certificates),
            ("COMMERCIAL_NOTES", self.commercial_notes),
            ("FINANCIAL_BILLS", self.financial_bills),
            ("FIF_QUOTAS", self.fif_quotas),
            ("OTHER_CREDIT_SECURITIES", self.other_credit_securities),
            ("FEDERAL_BONDS", self.federal_bonds),
            ("BANK_CERTIFICATES", self.bank_certificates),
            ("REPO_OPERATIONS", self.repo_operations),
            ("FIXED_INCOME_ASSETS", self.fixed_income_assets),
            ("FIDC_QUOTAS", self.fidc_quotas),
            ("DERIVATIVES_TOTAL", self.derivatives_total),
            ("FORWARD_LONG_POSITION", self.forward_long_position),
            ("OPTIONS_HOLDER_POSITION", self.options_holder_position),
            (
                "FUTURES_POSITIVE_ADJUSTMENT",
                self.futures_positive_adjustment,
            ),
            ("SWAP_RECEIVABLE", self.swap_receivable),
            ("COVERAGE_PROVIDED", self.coverage_provided),
            ("MARGIN_DEPOSITS", self.margin_deposits),
            (
                "SEGMENTED_PORTFOLIO_TOTAL",
                self.segmented_portfolio_total,
            ),
            ("SEGMENT_INDUSTRIAL", self.segment_industrial),
            ("SEGMENT_REAL_ESTATE", self.segment_real_estate),
            ("SEGMENT_AGRIBUSINESS", self.segment_agribusiness),
            ("SEGMENT_CREDIT_CARD", self.segment_credit_card),
            ("SEGMENT_COURT_ACTION", self.segment_court_action),
            (
                "SEGMENT_INTELLECTUAL_PROPERTY",
                self.segment_intellectual_property,
            ),
            ("SEGMENT_COMMERCIAL_TOTAL", self.segment_commercial_total),
            ("SEGMENT_COMMERCE", self.segment_commerce),
            ("SEGMENT_RETAIL", self.segment_retail),
            ("SEGMENT_LEASING", self.segment_leasing),
            ("SEGMENT_SERVICES_TOTAL", self.segment_services_total),
            ("SEGMENT_SERVICES", self.segment_services),
            ("SEGMENT_PUBLIC_SERVICES", self.segment_public_services),
            ("SEGMENT_EDUCATION_SERVICES", self.segment_education_services),
            (
                "SEGMENT_ENTERTAINMENT_SERVICES",
                self.segment_entertainment_services,
            ),
            ("SEGMENT_FINANCIAL_TOTAL", self.segment_financial_total),
            ("SEGMENT_PERSONAL_CREDIT", self.segment_personal_credit),
            ("SEGMENT_PAYROLL_CREDIT", self.segment_payroll_credit),
            ("SEGMENT_CORPORATE_CREDIT", self.segment_corporate_credit),
            ("SEGMENT_MIDDLE_MARKET", self.segment_middle_market),
            ("SEGMENT_VEHICLE_CREDIT", self.segment_vehicle_credit),
            (
                "SEGMENT_CORPORATE_REAL_ESTATE",
                self.segment_corporate_real_estate,
            ),
            (
                "SEGMENT_RESIDENTIAL_REAL_ESTATE",
                self.segment_residential_real_estate,
            ),
            ("SEGMENT_FINANCIAL_OTHER", self.segment_financial_other),
            ("SEGMENT_FACTORING_TOTAL", self.segment_factoring_total),
            (
                "SEGMENT_FACTORING_PERSONAL",
                self.segment_factoring_personal,
            ),
            (
                "SEGMENT_FACTORING_CORPORATE",
                self.segment_factoring_corporate,
            ),
            (
                "SEGMENT_PUBLIC_SECTOR_TOTAL",
                self.segment_public_sector_total,
            ),
            ("SEGMENT_COURT_ORDERED_DEBT", self.segment_court_ordered_debt),
            ("SEGMENT_TAX_CREDITS", self.segment_tax_credits),
            ("SEGMENT_ROYALTIES", self.segment_royalties),
            (
                "SEGMENT_PUBLIC_SECTOR_OTHER",
                self.segment_public_sector_other,
            ),
            ("CONSOLIDATED_DELINQUENCY", self.consolidated_delinquency),
            ("GROSS_PORTFOLIO", self.gross_portfolio),
            ("NPL_RATIO_PCT", self.npl_ratio_pct),
            ("NPL_RATIO", self.npl_ratio),
            ("LIQUIDITY_RATIO_PCT", self.liquidity_ratio_pct),
            ("LIQUIDITY_RATIO", self.liquidity_ratio),
            ("CONCENTRATION_RATIO_PCT", self.concentration_ratio_pct),
            ("CONCENTRATION_RATIO", self.concentration_ratio),
        ]
    }
}

/// Quality flags attached to one snapshot.
///
/// Derived annotations only: computing them never mutates the source record,
/// and recomputing them always yields the same flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFlags {
    /// Total assets reported as zero.
    pub zero_assets: bool,
    /// Delinquency reported against a zero-sized gross portfolio.
    pub zero_gross_portfolio_with_delinquency: bool,
    /// The fund holds assets but no credit position.
    pub no_position: bool,
}

impl ValidationFlags {
    /// Whether any flag is raised.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.zero_assets || self.zero_gross_portfolio_with_delinquency || self.no_position
    }
}
