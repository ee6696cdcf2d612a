//! Security allocation records, identity metadata and storage traits.

mod security_model;
mod security_traits;

pub use security_model::{
    AllocationRecord, SecurityAllocation, SecurityAllocationBuilder, SecurityInfo, SecurityType,
};
pub use security_traits::{SecurityStore, StoredAllocation};

#[cfg(test)]
pub(crate) use security_model::fixtures;
