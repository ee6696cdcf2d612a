//! Deterministic allocation provider for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use folioscope_core::errors::ProviderError;
use folioscope_core::lookup::AllocationProvider;
use folioscope_core::securities::{SecurityAllocation, SecurityInfo, SecurityType};
use folioscope_core::taxonomies::{
    EconomicStatusAllocation, FundAssetAllocation, GrowthValueAllocation, MarketCapAllocation,
    RegionAllocation, SectorAllocation, UsInternationalAllocation,
};

const PROVIDER_ID: &str = "MOCK";

/// Returns the same synthetic allocation for any symbol unless a fixture or
/// failure is registered for it. Counts every call.
#[derive(Default)]
pub struct MockAllocationProvider {
    fixtures: HashMap<String, SecurityAllocation>,
    failures: HashSet<String>,
    calls: AtomicUsize,
}

impl MockAllocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `allocation` for its symbol.
    pub fn with_fixture(mut self, allocation: SecurityAllocation) -> Self {
        self.fixtures
            .insert(allocation.symbol().to_string(), allocation);
        self
    }

    /// Makes lookups for `symbol` fail with `NotFound`.
    pub fn with_failure(mut self, symbol: impl Into<String>) -> Self {
        self.failures.insert(symbol.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The synthetic allocation served for unknown symbols.
    pub fn synthetic_allocation(symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        let info = SecurityInfo::new(format!("Mock Security: {}", symbol), SecurityType::Etf)
            .with_homepage_url("https://www.mock.com")
            .with_expense_ratio(Decimal::new(1, 1));

        let sector = SectorAllocation {
            information_technology: 50,
            health_care: 50,
            ..Default::default()
        };

        Ok(SecurityAllocation::builder(symbol, info)
            .asset_class(FundAssetAllocation::try_new(50, 50, 0, 0)?)
            .market_cap(MarketCapAllocation::try_new(40, 30, 30)?)
            .us_international(UsInternationalAllocation::try_new(50, 50)?)
            .region(RegionAllocation::try_new(100, 0, 0, 0, 0)?)
            .growth_value(GrowthValueAllocation::try_new(50, 50)?)
            .economic_status(EconomicStatusAllocation::try_new(50, 50, 0)?)
            .sector(sector)
            .build()?)
    }
}

#[async_trait]
impl AllocationProvider for MockAllocationProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failures.contains(symbol) {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        if let Some(allocation) = self.fixtures.get(symbol) {
            return Ok(allocation.clone());
        }
        Self::synthetic_allocation(symbol)
    }
}
