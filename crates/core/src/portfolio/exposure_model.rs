//! Structured exposure report for presentation layers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::breakdown_model::Breakdown;
use super::holdings_model::HoldingSummary;
use super::portfolio_model::PortfolioType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExposureIssueKind {
    /// Allocation data could not be fetched for a held symbol.
    LookupFailed,
    /// A breakdown or ratio had a zero denominator.
    EmptyTotal,
    /// A breakdown or ratio does not fit in a `Decimal`.
    Overflow,
}

/// A non-fatal problem found while building a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureIssue {
    pub kind: ExposureIssueKind,
    /// Symbol or measure the issue applies to
    pub subject: String,
    pub message: String,
}

/// Everything known about a portfolio's exposure, rendered as far as the
/// available data allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioExposure {
    pub account_name: String,
    pub source: String,
    pub portfolio_type: Option<PortfolioType>,
    pub cash: Decimal,
    pub total_value: Decimal,
    pub total_return: Option<Decimal>,
    pub expense_ratio: Option<Decimal>,
    pub holdings: Vec<HoldingSummary>,
    pub breakdowns: Vec<Breakdown>,
    pub unresolved_symbols: Vec<String>,
    pub issues: Vec<ExposureIssue>,
}

impl PortfolioExposure {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
