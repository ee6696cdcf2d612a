//! Persistence interface for resolved security allocations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::security_model::SecurityAllocation;
use crate::errors::Result;

/// An allocation as held by a [`SecurityStore`], with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAllocation {
    pub allocation: SecurityAllocation,
    pub modified_at: DateTime<Utc>,
}

impl StoredAllocation {
    /// Whether the record is older than `max_age` at `now`.
    pub fn is_stale(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.modified_at > max_age
    }
}

/// Storage interface for security allocation records.
///
/// Reads are sync, writes are async.
#[async_trait]
pub trait SecurityStore: Send + Sync {
    fn contains(&self, symbol: &str) -> Result<bool>;

    fn get(&self, symbol: &str) -> Result<Option<StoredAllocation>>;

    /// Inserts or replaces the record for the allocation's symbol.
    async fn insert(&self, allocation: &SecurityAllocation) -> Result<StoredAllocation>;
}
