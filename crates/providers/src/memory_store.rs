//! In-memory security store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;

use folioscope_core::errors::{Error, Result};
use folioscope_core::securities::{
    AllocationRecord, SecurityAllocation, SecurityStore, StoredAllocation,
};

/// A flattened record and its write time.
#[derive(Debug, Clone)]
struct StoredRecord {
    record: AllocationRecord,
    modified_at: DateTime<Utc>,
}

/// [`SecurityStore`] keeping flattened allocation records in memory.
#[derive(Default)]
pub struct InMemorySecurityStore {
    records: DashMap<String, StoredRecord>,
}

impl InMemorySecurityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record with an explicit timestamp.
    pub fn insert_at(&self, allocation: &SecurityAllocation, modified_at: DateTime<Utc>) {
        self.records.insert(
            allocation.symbol().to_string(),
            StoredRecord {
                record: allocation.to_record(),
                modified_at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SecurityStore for InMemorySecurityStore {
    fn contains(&self, symbol: &str) -> Result<bool> {
        Ok(self.records.contains_key(symbol))
    }

    fn get(&self, symbol: &str) -> Result<Option<StoredAllocation>> {
        let Some(stored) = self.records.get(symbol).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        let allocation = SecurityAllocation::from_record(&stored.record)
            .map_err(|e| Error::Store(format!("stored record for {} is invalid: {}", symbol, e)))?;
        Ok(Some(StoredAllocation {
            allocation,
            modified_at: stored.modified_at,
        }))
    }

    async fn insert(&self, allocation: &SecurityAllocation) -> Result<StoredAllocation> {
        let modified_at = Utc::now();
        self.insert_at(allocation, modified_at);
        debug!("Stored allocation for {}", allocation.symbol());
        Ok(StoredAllocation {
            allocation: allocation.clone(),
            modified_at,
        })
    }
}
