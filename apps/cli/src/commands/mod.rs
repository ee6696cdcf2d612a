//! Command implementations.

pub mod analyze;
pub mod source;
