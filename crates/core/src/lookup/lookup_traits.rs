//! Allocation provider trait definitions.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::securities::SecurityAllocation;

/// Trait for allocation data providers.
///
/// Implement this trait to add a new source of per-security allocation
/// data (an LLM, a persisted store, a fixture set). The lookup service
/// wraps a single provider with a process-lifetime cache.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use folioscope_core::lookup::AllocationProvider;
///
/// struct StaticProvider;
///
/// #[async_trait]
/// impl AllocationProvider for StaticProvider {
///     fn id(&self) -> &'static str {
///         "STATIC"
///     }
///
///     async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
///         Err(ProviderError::NotFound(symbol.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait AllocationProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Resolves the full allocation record for a symbol.
    ///
    /// Returned records are already validated by construction. Failures are
    /// reported as `ProviderError` and are never cached by the caller.
    async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError>;
}
