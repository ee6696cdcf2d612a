//! Folioscope Providers - allocation data sources and security stores.
//!
//! Implements the `AllocationProvider` and `SecurityStore` traits defined in
//! `folioscope-core`.

pub mod errors;
pub mod memory_store;
pub mod mock;
pub mod openai;
pub mod rate_limiter;
pub mod store_backed;

pub use errors::ProviderConfigError;
pub use memory_store::InMemorySecurityStore;
pub use mock::MockAllocationProvider;
pub use openai::{OpenAiAllocationProvider, OpenAiConfig};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use store_backed::StoreBackedProvider;
