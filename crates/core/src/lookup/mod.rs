//! Cached allocation lookup over a pluggable provider.

mod lookup_model;
mod lookup_service;
mod lookup_traits;


pub use lookup_model::*;
pub use lookup_service::{AllocationLookupService, LookupResult};
pub use lookup_traits::AllocationProvider;
