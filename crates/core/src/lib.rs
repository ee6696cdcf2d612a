//! Folioscope Core - Domain entities, services, and traits.
//!
//! This crate contains the exposure aggregation engine: allocation
//! taxonomies, per-security allocation records, the cached allocation
//! lookup and the portfolio aggregator. It is provider and storage agnostic
//! and defines traits that are implemented by the `providers` crate.

pub mod datasource;
pub mod errors;
pub mod lookup;
pub mod portfolio;
pub mod securities;
pub mod taxonomies;

// Re-export common types from the portfolio and securities modules
pub use portfolio::*;
pub use securities::{AllocationRecord, SecurityAllocation, SecurityInfo, SecurityType};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
