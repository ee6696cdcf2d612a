//! Lazy entry point for exposure queries.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::breakdown_model::Breakdown;
use super::exposure_model::{ExposureIssue, ExposureIssueKind, PortfolioExposure};
use super::holdings_model::HoldingSummary;
use super::portfolio_model::{CompletionReport, Portfolio};
use crate::errors::{AggregationError, Result};
use crate::lookup::AllocationLookupService;
use crate::taxonomies::TaxonomyKind;

/// Trait for exposure queries over a portfolio.
///
/// Every query completes the portfolio first if it is not already complete.
#[async_trait]
pub trait ExposureServiceTrait: Send + Sync {
    /// Completes the portfolio if needed.
    async fn ensure_complete(&self, portfolio: &mut Portfolio) -> CompletionReport;

    async fn holdings_table(&self, portfolio: &mut Portfolio) -> Vec<HoldingSummary>;

    async fn breakdown(&self, portfolio: &mut Portfolio, kind: TaxonomyKind) -> Result<Breakdown>;

    async fn total_expense_ratio(&self, portfolio: &mut Portfolio) -> Result<Decimal>;

    /// Builds the full report. Failed lookups, empty totals and overflows
    /// are recorded as issues and never abort the report.
    async fn get_portfolio_exposure(&self, portfolio: &mut Portfolio) -> PortfolioExposure;
}

/// Computes exposure reports using a shared allocation lookup cache.
pub struct ExposureService {
    lookup: Arc<AllocationLookupService>,
}

impl ExposureService {
    pub fn new(lookup: Arc<AllocationLookupService>) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &Arc<AllocationLookupService> {
        &self.lookup
    }
}

fn aggregation_issue(error: AggregationError) -> ExposureIssue {
    let (kind, measure) = match &error {
        AggregationError::EmptyTotal { measure } => (ExposureIssueKind::EmptyTotal, measure),
        AggregationError::Overflow { measure } => (ExposureIssueKind::Overflow, measure),
    };
    ExposureIssue {
        kind,
        subject: measure.clone(),
        message: error.to_string(),
    }
}

#[async_trait]
impl ExposureServiceTrait for ExposureService {
    async fn ensure_complete(&self, portfolio: &mut Portfolio) -> CompletionReport {
        portfolio.complete(&self.lookup).await
    }

    async fn holdings_table(&self, portfolio: &mut Portfolio) -> Vec<HoldingSummary> {
        self.ensure_complete(portfolio).await;
        portfolio.holdings_table()
    }

    async fn breakdown(&self, portfolio: &mut Portfolio, kind: TaxonomyKind) -> Result<Breakdown> {
        self.ensure_complete(portfolio).await;
        Ok(portfolio.breakdown(kind)?)
    }

    async fn total_expense_ratio(&self, portfolio: &mut Portfolio) -> Result<Decimal> {
        self.ensure_complete(portfolio).await;
        Ok(portfolio.total_expense_ratio()?)
    }

    async fn get_portfolio_exposure(&self, portfolio: &mut Portfolio) -> PortfolioExposure {
        let report = self.ensure_complete(portfolio).await;

        // Failures from an earlier completion are not in this report, so
        // derive lookup issues from what is still unresolved.
        let mut issues: Vec<ExposureIssue> = portfolio
            .unresolved_symbols()
            .into_iter()
            .map(|symbol| {
                let message = report
                    .failed
                    .iter()
                    .find(|failure| failure.symbol == symbol)
                    .map(|failure| failure.error.to_string())
                    .unwrap_or_else(|| "No allocation data available".to_string());
                ExposureIssue {
                    kind: ExposureIssueKind::LookupFailed,
                    subject: symbol,
                    message,
                }
            })
            .collect();

        let mut breakdowns = Vec::with_capacity(TaxonomyKind::ALL.len());
        for kind in TaxonomyKind::ALL {
            match portfolio.breakdown(kind) {
                Ok(breakdown) => breakdowns.push(breakdown),
                Err(e) => {
                    debug!("Skipping {} breakdown: {}", kind, e);
                    issues.push(aggregation_issue(e));
                }
            }
        }

        let expense_ratio = match portfolio.total_expense_ratio() {
            Ok(ratio) => Some(ratio),
            Err(e) => {
                issues.push(aggregation_issue(e));
                None
            }
        };

        if !issues.is_empty() {
            warn!(
                "Exposure report for '{}' has {} issues",
                portfolio.account_name(),
                issues.len()
            );
        }

        PortfolioExposure {
            account_name: portfolio.account_name().to_string(),
            source: portfolio.source().to_string(),
            portfolio_type: portfolio.portfolio_type(),
            cash: portfolio.cash(),
            total_value: portfolio.total_value(),
            total_return: portfolio.total_return(),
            expense_ratio,
            holdings: portfolio.holdings_table(),
            breakdowns,
            unresolved_symbols: portfolio.unresolved_symbols(),
            issues,
        }
    }
}
