//! Portfolio aggregate: holdings, cash, allocation data and completion state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::breakdown_calculator::{calculate_breakdown, calculate_expense_ratio};
use super::breakdown_model::Breakdown;
use super::holdings_model::{Holding, HoldingSummary};
use crate::errors::{AggregationError, ProviderError, ValidationError};
use crate::lookup::AllocationLookupService;
use crate::securities::{AllocationRecord, SecurityAllocation};
use crate::taxonomies::{Taxonomy, TaxonomyKind};

/// Account category. Descriptive only; no calculation depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortfolioType {
    Taxable,
    TraditionalIra,
    RothIra,
    SepIra,
    SimpleIra,
    Solo401k,
    Traditional401k,
    Roth401k,
    Acct403b,
    Acct457b,
    Hsa,
    Esa,
    Ugma,
    Utma,
    Trust,
    Custodial,
    Joint,
    Other,
}

impl PortfolioType {
    pub const ALL: [PortfolioType; 18] = [
        PortfolioType::Taxable,
        PortfolioType::TraditionalIra,
        PortfolioType::RothIra,
        PortfolioType::SepIra,
        PortfolioType::SimpleIra,
        PortfolioType::Solo401k,
        PortfolioType::Traditional401k,
        PortfolioType::Roth401k,
        PortfolioType::Acct403b,
        PortfolioType::Acct457b,
        PortfolioType::Hsa,
        PortfolioType::Esa,
        PortfolioType::Ugma,
        PortfolioType::Utma,
        PortfolioType::Trust,
        PortfolioType::Custodial,
        PortfolioType::Joint,
        PortfolioType::Other,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            PortfolioType::Taxable => "Taxable",
            PortfolioType::TraditionalIra => "Traditional IRA",
            PortfolioType::RothIra => "Roth IRA",
            PortfolioType::SepIra => "SEP IRA",
            PortfolioType::SimpleIra => "SIMPLE IRA",
            PortfolioType::Solo401k => "Solo 401k",
            PortfolioType::Traditional401k => "Traditional 401k",
            PortfolioType::Roth401k => "Roth 401k",
            PortfolioType::Acct403b => "403b",
            PortfolioType::Acct457b => "457b",
            PortfolioType::Hsa => "HSA",
            PortfolioType::Esa => "ESA",
            PortfolioType::Ugma => "UGMA",
            PortfolioType::Utma => "UTMA",
            PortfolioType::Trust => "Trust",
            PortfolioType::Custodial => "Custodial",
            PortfolioType::Joint => "Joint",
            PortfolioType::Other => "Other",
        }
    }
}

impl fmt::Display for PortfolioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PortfolioType {
    type Err = ValidationError;

    /// Matches display names loosely: "roth-ira", "Roth IRA" and "ROTH_IRA" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn squash(value: &str) -> String {
            value
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_uppercase()
        }

        let wanted = squash(s);
        PortfolioType::ALL
            .into_iter()
            .find(|t| squash(t.display_name()) == wanted)
            .ok_or_else(|| ValidationError::InvalidInput(format!("unknown portfolio type '{}'", s)))
    }
}

/// Lifecycle of a portfolio's allocation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionState {
    /// No holdings yet.
    Empty,
    /// Holdings present, allocation data not yet fetched for all symbols.
    Populated,
    /// Fetching allocation data.
    Completing,
    /// Every held symbol was looked up (successfully or not).
    Complete,
}

/// A lookup that failed during completion.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLookup {
    pub symbol: String,
    pub error: ProviderError,
}

/// What a call to [`Portfolio::complete`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionReport {
    /// The portfolio was already complete and nothing was fetched.
    pub already_complete: bool,
    pub fetched: Vec<String>,
    pub failed: Vec<FailedLookup>,
    pub names_backfilled: usize,
}

impl CompletionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An investor account: positions, cash and per-security allocation data.
#[derive(Debug, Clone)]
pub struct Portfolio {
    account_name: String,
    source: String,
    portfolio_type: Option<PortfolioType>,
    cash: Decimal,
    holdings: BTreeMap<String, Holding>,
    allocations: BTreeMap<String, Arc<SecurityAllocation>>,
    state: CompletionState,
}

impl Portfolio {
    pub fn new(
        account_name: impl Into<String>,
        source: impl Into<String>,
        portfolio_type: Option<PortfolioType>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            source: source.into(),
            portfolio_type,
            cash: Decimal::ZERO,
            holdings: BTreeMap::new(),
            allocations: BTreeMap::new(),
            state: CompletionState::Empty,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn set_account_name(&mut self, account_name: impl Into<String>) {
        self.account_name = account_name.into();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn portfolio_type(&self) -> Option<PortfolioType> {
        self.portfolio_type
    }

    pub fn set_portfolio_type(&mut self, portfolio_type: Option<PortfolioType>) {
        self.portfolio_type = portfolio_type;
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn set_cash(&mut self, cash: Decimal) -> Result<(), ValidationError> {
        if cash.is_sign_negative() && !cash.is_zero() {
            return Err(ValidationError::NegativeCash(cash));
        }
        if checked_total(cash, self.holdings.values()).is_none() {
            return Err(ValidationError::InvalidInput(
                "value overflow for cash".to_string(),
            ));
        }
        self.cash = cash;
        Ok(())
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == CompletionState::Complete
    }

    pub fn holdings(&self) -> &BTreeMap<String, Holding> {
        &self.holdings
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn allocations(&self) -> &BTreeMap<String, Arc<SecurityAllocation>> {
        &self.allocations
    }

    pub fn allocation(&self, symbol: &str) -> Option<&Arc<SecurityAllocation>> {
        self.allocations.get(symbol)
    }

    /// Adds or replaces the holding for its symbol.
    ///
    /// A complete portfolio stays complete; call
    /// [`Portfolio::invalidate_completion`] to fetch data for new symbols.
    pub fn add_security(&mut self, holding: Holding) -> Result<(), ValidationError> {
        holding.validate()?;

        let others = self.holdings.values().filter(|h| h.symbol != holding.symbol);
        if checked_total(self.cash, others.chain(std::iter::once(&holding))).is_none() {
            return Err(ValidationError::InvalidInput(format!(
                "value overflow for {}",
                holding.symbol
            )));
        }

        if self.is_complete() && !self.allocations.contains_key(&holding.symbol) {
            warn!(
                "Holding {} added to completed portfolio '{}'; its allocation data will not be fetched",
                holding.symbol, self.account_name
            );
        }

        if let Some(previous) = self.holdings.insert(holding.symbol.clone(), holding) {
            debug!("Replaced existing holding for {}", previous.symbol);
        }
        if self.state == CompletionState::Empty {
            self.state = CompletionState::Populated;
        }
        Ok(())
    }

    /// Records allocation data for a symbol, replacing any previous record.
    pub fn add_security_allocation_data(&mut self, allocation: impl Into<Arc<SecurityAllocation>>) {
        let allocation = allocation.into();
        self.allocations
            .insert(allocation.symbol().to_string(), allocation);
    }

    /// Returns a complete portfolio to `Populated` so the next completion
    /// fetches symbols that are still missing allocation data.
    pub fn invalidate_completion(&mut self) {
        if self.is_complete() {
            self.state = if self.holdings.is_empty() {
                CompletionState::Empty
            } else {
                CompletionState::Populated
            };
        }
    }

    /// Cash plus the total value of every holding.
    ///
    /// `add_security` and `set_cash` reject values that would overflow this sum.
    pub fn total_value(&self) -> Decimal {
        checked_total(self.cash, self.holdings.values()).unwrap_or(Decimal::MAX)
    }

    /// Sum of the defined holding returns; `None` when no holding has one
    /// or the sum overflows.
    pub fn total_return(&self) -> Option<Decimal> {
        let mut returns = self.holdings.values().filter_map(Holding::total_return);
        let first = returns.next()?;
        returns.try_fold(first, |acc, r| acc.checked_add(r))
    }

    pub fn holdings_table(&self) -> Vec<HoldingSummary> {
        self.holdings.values().map(Holding::to_summary).collect()
    }

    /// Flattened allocation records, one per symbol with allocation data.
    pub fn allocation_table(&self) -> Vec<AllocationRecord> {
        self.allocations.values().map(|a| a.to_record()).collect()
    }

    /// Held symbols that have no allocation data, sorted.
    pub fn unresolved_symbols(&self) -> Vec<String> {
        self.holdings
            .keys()
            .filter(|symbol| !self.allocations.contains_key(*symbol))
            .cloned()
            .collect()
    }

    /// Breakdown for the taxonomy type `T`.
    pub fn bucketed_breakdown<T: Taxonomy>(&self) -> Result<Breakdown, AggregationError> {
        self.breakdown(T::KIND)
    }

    pub fn breakdown(&self, kind: TaxonomyKind) -> Result<Breakdown, AggregationError> {
        calculate_breakdown(kind, &self.holdings, &self.allocations)
    }

    /// Value-weighted expense ratio over the whole portfolio, cash included.
    pub fn total_expense_ratio(&self) -> Result<Decimal, AggregationError> {
        calculate_expense_ratio(&self.holdings, &self.allocations, self.total_value())
    }

    /// Fetches allocation data for held symbols that lack it and backfills
    /// missing holding names.
    ///
    /// Runs once: a complete portfolio returns immediately without calling
    /// the lookup service. Failed lookups are reported, and the portfolio
    /// is still marked complete.
    pub async fn complete(&mut self, lookup: &AllocationLookupService) -> CompletionReport {
        if self.is_complete() {
            debug!("Portfolio '{}' already complete", self.account_name);
            return CompletionReport {
                already_complete: true,
                ..Default::default()
            };
        }

        self.state = CompletionState::Completing;
        let mut report = CompletionReport::default();

        let missing = self.unresolved_symbols();
        for (symbol, result) in lookup.prefetch(&missing).await {
            match result {
                Ok(allocation) => {
                    self.allocations.insert(symbol.clone(), allocation);
                    report.fetched.push(symbol);
                }
                Err(error) => {
                    debug!("No allocation data for {}: {}", symbol, error);
                    report.failed.push(FailedLookup { symbol, error });
                }
            }
        }

        for holding in self.holdings.values_mut() {
            let Some(allocation) = self.allocations.get(&holding.symbol) else {
                continue;
            };
            if holding.name.as_deref().map_or(true, str::is_empty) {
                holding.name = Some(allocation.security_name().to_string());
                report.names_backfilled += 1;
            }
            if holding.security_type.is_none() {
                holding.security_type = Some(allocation.security_type());
            }
        }

        self.state = CompletionState::Complete;
        info!(
            "Completed portfolio '{}': {} fetched, {} failed, {} names backfilled",
            self.account_name,
            report.fetched.len(),
            report.failed.len(),
            report.names_backfilled
        );
        report
    }
}

/// Cash plus holding values, `None` when the sum does not fit in a `Decimal`.
fn checked_total<'a>(
    cash: Decimal,
    holdings: impl IntoIterator<Item = &'a Holding>,
) -> Option<Decimal> {
    holdings
        .into_iter()
        .try_fold(cash, |acc, holding| acc.checked_add(holding.total_value))
}
