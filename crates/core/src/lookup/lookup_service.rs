use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use tokio::sync::OnceCell;

use super::lookup_model::LookupConfig;
use super::lookup_traits::AllocationProvider;
use crate::errors::ProviderError;
use crate::securities::SecurityAllocation;

/// Outcome of one lookup in a batch.
pub type LookupResult = Result<Arc<SecurityAllocation>, ProviderError>;

/// Process-lifetime cache in front of an [`AllocationProvider`].
///
/// Each symbol is resolved by at most one successful provider call for the
/// lifetime of the service, including under concurrent requests for the
/// same symbol. Failed lookups are not cached, so a later call retries the
/// provider. There is no eviction.
pub struct AllocationLookupService {
    provider: Arc<dyn AllocationProvider>,
    cache: DashMap<String, Arc<OnceCell<Arc<SecurityAllocation>>>>,
    config: LookupConfig,
}

impl AllocationLookupService {
    pub fn new(provider: Arc<dyn AllocationProvider>) -> Self {
        Self::with_config(provider, LookupConfig::default())
    }

    pub fn with_config(provider: Arc<dyn AllocationProvider>, config: LookupConfig) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
            config,
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Returns the allocation for `symbol`, calling the provider on a miss.
    pub async fn get_allocation(&self, symbol: &str) -> LookupResult {
        let key = symbol.trim().to_string();
        if key.is_empty() {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }

        // Clone the cell out so the map shard lock is released before awaiting.
        let cell = self.cache.entry(key.clone()).or_default().clone();

        if let Some(allocation) = cell.get() {
            debug!("Allocation cache hit for {}", key);
            return Ok(allocation.clone());
        }

        let allocation = cell
            .get_or_try_init(|| self.fetch(&key))
            .await
            .map_err(|e| {
                warn!(
                    "Allocation lookup for {} via {} failed: {}",
                    key,
                    self.provider.id(),
                    e
                );
                e
            })?;

        Ok(allocation.clone())
    }

    async fn fetch(&self, symbol: &str) -> LookupResult {
        let timeout = self.config.request_timeout;
        debug!(
            "Allocation cache miss for {}, calling {}",
            symbol,
            self.provider.id()
        );

        match tokio::time::timeout(timeout, self.provider.lookup_allocation(symbol)).await {
            Ok(Ok(allocation)) => {
                if allocation.symbol() != symbol {
                    debug!(
                        "Provider {} answered {} for requested symbol {}",
                        self.provider.id(),
                        allocation.symbol(),
                        symbol
                    );
                }
                Ok(Arc::new(allocation))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout {
                provider: self.provider.id().to_string(),
                timeout,
            }),
        }
    }

    /// Resolves many symbols with bounded concurrency.
    ///
    /// Duplicates are collapsed; results come back in first-seen order.
    pub async fn prefetch(&self, symbols: &[String]) -> Vec<(String, LookupResult)> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        if unique.is_empty() {
            return Vec::new();
        }

        info!(
            "Prefetching allocations for {} symbols ({} in flight)",
            unique.len(),
            self.config.max_in_flight
        );

        stream::iter(unique)
            .map(|symbol| async move {
                let result = self.get_allocation(&symbol).await;
                (symbol, result)
            })
            .buffered(self.config.max_in_flight.max(1))
            .collect()
            .await
    }

    /// Returns a cached allocation without calling the provider.
    pub fn cached(&self, symbol: &str) -> Option<Arc<SecurityAllocation>> {
        self.cache
            .get(symbol.trim())
            .and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.cached(symbol).is_some()
    }

    /// Number of resolved symbols.
    pub fn len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
