use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning for [`super::AllocationLookupService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupConfig {
    /// Upper bound on concurrent provider calls during a batch prefetch.
    pub max_in_flight: usize,
    /// Applied to every provider call.
    pub request_timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl LookupConfig {
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
