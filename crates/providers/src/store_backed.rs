//! Provider that serves allocations from a [`SecurityStore`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};

use folioscope_core::errors::ProviderError;
use folioscope_core::lookup::AllocationProvider;
use folioscope_core::securities::{SecurityAllocation, SecurityStore};

const PROVIDER_ID: &str = "STORE";

/// Reads allocations from a store and, on a miss or a stale record,
/// delegates to a fallback provider and saves its answer.
///
/// Without a fallback a miss is `NotFound`. A stale record is still served
/// when the fallback fails.
pub struct StoreBackedProvider {
    store: Arc<dyn SecurityStore>,
    fallback: Option<Arc<dyn AllocationProvider>>,
    max_age: Option<chrono::Duration>,
}

impl StoreBackedProvider {
    pub fn new(store: Arc<dyn SecurityStore>) -> Self {
        Self {
            store,
            fallback: None,
            max_age: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn AllocationProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Records older than `max_age` are refreshed through the fallback.
    pub fn with_max_age(mut self, max_age: chrono::Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    fn store_error(e: folioscope_core::Error) -> ProviderError {
        ProviderError::Unavailable {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl AllocationProvider for StoreBackedProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        let stored = self.store.get(symbol).map_err(Self::store_error)?;

        let stale = match (&stored, self.max_age) {
            (Some(record), Some(max_age)) => record.is_stale(max_age, Utc::now()),
            _ => false,
        };

        if let Some(record) = &stored {
            if !stale {
                debug!("Serving {} from store", symbol);
                return Ok(record.allocation.clone());
            }
            debug!("Stored allocation for {} is stale", symbol);
        }

        let Some(fallback) = &self.fallback else {
            return match stored {
                Some(record) => Ok(record.allocation),
                None => Err(ProviderError::NotFound(symbol.to_string())),
            };
        };

        match fallback.lookup_allocation(symbol).await {
            Ok(allocation) => {
                if let Err(e) = self.store.insert(&allocation).await {
                    warn!("Failed to store allocation for {}: {}", symbol, e);
                }
                Ok(allocation)
            }
            Err(e) => match stored {
                Some(record) => {
                    warn!(
                        "Refreshing {} via {} failed ({}), serving stale record",
                        symbol,
                        fallback.id(),
                        e
                    );
                    Ok(record.allocation)
                }
                None => Err(e),
            },
        }
    }
}
