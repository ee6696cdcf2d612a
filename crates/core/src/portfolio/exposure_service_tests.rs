use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{Error, ProviderError};
use crate::lookup::{AllocationLookupService, AllocationProvider};
use crate::securities::{fixtures, SecurityAllocation};
use crate::taxonomies::TaxonomyKind;

/// Knows every symbol except those starting with "X".
#[derive(Default)]
struct PrefixProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl AllocationProvider for PrefixProvider {
    fn id(&self) -> &'static str {
        "PREFIX"
    }

    async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if symbol.starts_with('X') {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        Ok(fixtures::allocation(symbol, Some(dec!(0.1))))
    }
}

fn service() -> (ExposureService, Arc<PrefixProvider>) {
    let provider = Arc::new(PrefixProvider::default());
    let lookup = Arc::new(AllocationLookupService::new(provider.clone()));
    (ExposureService::new(lookup), provider)
}

fn portfolio(symbols: &[&str]) -> Portfolio {
    let mut portfolio = Portfolio::new("Roth IRA -XXXX", "TEST", Some(PortfolioType::RothIra));
    portfolio.set_cash(dec!(100)).unwrap();
    for symbol in symbols {
        portfolio
            .add_security(
                Holding::new(*symbol, dec!(10), dec!(10))
                    .unwrap()
                    .with_avg_price_paid(dec!(5)),
            )
            .unwrap();
    }
    portfolio
}

#[tokio::test]
async fn test_queries_complete_lazily() {
    let (service, provider) = service();
    let mut portfolio = portfolio(&["VTI", "BND"]);
    assert_eq!(portfolio.state(), CompletionState::Populated);

    let table = service.holdings_table(&mut portfolio).await;
    assert!(portfolio.is_complete());
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].name.as_deref(), Some("BND Fund"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    service
        .breakdown(&mut portfolio, TaxonomyKind::Region)
        .await
        .unwrap();
    service.total_expense_ratio(&mut portfolio).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lookup_cache_is_shared_across_portfolios() {
    let (service, provider) = service();

    let mut first = portfolio(&["VTI"]);
    let mut second = portfolio(&["VTI"]);
    service.ensure_complete(&mut first).await;
    service.ensure_complete(&mut second).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(
        first.allocation("VTI").unwrap(),
        second.allocation("VTI").unwrap()
    ));
}

#[tokio::test]
async fn test_report_renders_partial_data() {
    let (service, _) = service();
    let mut portfolio = portfolio(&["VTI", "XYZ"]);

    let report = service.get_portfolio_exposure(&mut portfolio).await;

    assert_eq!(report.account_name, "Roth IRA -XXXX");
    assert_eq!(report.total_value, dec!(300));
    assert_eq!(report.total_return, Some(dec!(100)));
    assert_eq!(report.breakdowns.len(), TaxonomyKind::ALL.len());
    assert_eq!(report.unresolved_symbols, vec!["XYZ".to_string()]);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, ExposureIssueKind::LookupFailed);
    assert_eq!(report.issues[0].subject, "XYZ");
    assert_eq!(report.issues[0].message, "No allocation data for symbol: XYZ");

    let region = &report.breakdowns[1];
    assert_eq!(region.taxonomy, TaxonomyKind::Region);
    assert_eq!(region.total_value, dec!(100));
    assert_eq!(region.excluded_symbols, vec!["XYZ".to_string()]);

    // 100 * 0.1 over 300
    assert_eq!(report.expense_ratio.unwrap().round_dp(6), dec!(0.033333));
}

#[tokio::test]
async fn test_repeated_report_keeps_lookup_issues() {
    let (service, provider) = service();
    let mut portfolio = portfolio(&["XYZ"]);

    service.get_portfolio_exposure(&mut portfolio).await;
    let report = service.get_portfolio_exposure(&mut portfolio).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert!(report
        .issues
        .iter()
        .any(|i| i.kind == ExposureIssueKind::LookupFailed && i.subject == "XYZ"));
}

#[tokio::test]
async fn test_empty_portfolio_report_lists_empty_totals() {
    let (service, _) = service();
    let mut portfolio = Portfolio::new("Empty", "TEST", None);

    let report = service.get_portfolio_exposure(&mut portfolio).await;

    assert_eq!(report.total_value, Decimal::ZERO);
    assert!(report.breakdowns.is_empty());
    assert_eq!(report.expense_ratio, None);
    assert_eq!(report.issues.len(), TaxonomyKind::ALL.len() + 1);
    assert!(report
        .issues
        .iter()
        .all(|i| i.kind == ExposureIssueKind::EmptyTotal));

    let err = service
        .breakdown(&mut portfolio, TaxonomyKind::Sector)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Aggregation(_)));
}

#[tokio::test]
async fn test_overflowing_breakdowns_become_issues() {
    let (service, _) = service();
    let quantity: Decimal = "40000000000000000000000000000".parse().unwrap();
    let mut portfolio = Portfolio::new("Huge", "TEST", None);
    for symbol in ["AAA", "BBB"] {
        portfolio
            .add_security(
                Holding::new(symbol, quantity, dec!(1))
                    .unwrap()
                    .with_total_value(dec!(1)),
            )
            .unwrap();
    }

    let report = service.get_portfolio_exposure(&mut portfolio).await;

    assert!(report.breakdowns.is_empty());
    assert_eq!(report.issues.len(), TaxonomyKind::ALL.len());
    assert!(report
        .issues
        .iter()
        .all(|i| i.kind == ExposureIssueKind::Overflow && i.message.contains("overflow")));
    assert!(report.expense_ratio.is_some());
}

#[tokio::test]
async fn test_report_serializes_as_camel_case() {
    let (service, _) = service();
    let mut portfolio = portfolio(&["VTI"]);

    let report = service.get_portfolio_exposure(&mut portfolio).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["accountName"], "Roth IRA -XXXX");
    assert_eq!(json["portfolioType"], "ROTH_IRA");
    assert_eq!(json["breakdowns"][0]["taxonomyName"], "US / International");
    assert_eq!(json["breakdowns"][0]["buckets"][0]["label"], "US");
}
