//! Allocation taxonomies: fixed sets of named percentage buckets.

mod taxonomy_model;
mod taxonomy_traits;

pub use taxonomy_model::*;
pub use taxonomy_traits::*;
