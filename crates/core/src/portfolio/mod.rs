//! Portfolio module - holdings, completion and exposure aggregation.

mod breakdown_calculator;
mod breakdown_model;
mod exposure_model;
mod exposure_service;
mod holdings_model;
mod portfolio_model;

#[cfg(test)]
mod exposure_service_tests;

pub use breakdown_model::{Breakdown, BucketAllocation};
pub use exposure_model::{ExposureIssue, ExposureIssueKind, PortfolioExposure};
pub use exposure_service::{ExposureService, ExposureServiceTrait};
pub use holdings_model::{Holding, HoldingSummary};
pub use portfolio_model::{
    CompletionReport, CompletionState, FailedLookup, Portfolio, PortfolioType,
};
