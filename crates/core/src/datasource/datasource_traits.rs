//! Holdings source trait and source identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DataSourceError, Result};
use crate::portfolio::Portfolio;

/// Supported broker export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceType {
    #[serde(rename = "etrade-csv")]
    ETradeCsv,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 1] = [DataSourceType::ETradeCsv];

    /// Stable identifier used on the command line and in configuration.
    pub fn value(&self) -> &'static str {
        match self {
            DataSourceType::ETradeCsv => "etrade-csv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DataSourceType::ETradeCsv => "E*Trade Account: CSV File",
        }
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for DataSourceType {
    type Err = DataSourceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DataSourceType::ALL
            .into_iter()
            .find(|t| t.value() == s.trim())
            .ok_or_else(|| DataSourceError::UnknownSource(s.to_string()))
    }
}

/// A parser for one broker export format.
pub trait HoldingsSource: Send + Sync {
    fn source_type(&self) -> DataSourceType;

    /// Whether the input looks like this source's format.
    fn validate(&self) -> bool;

    /// Parses the input into a populated, not yet completed, portfolio.
    fn get_portfolio(&self) -> Result<Portfolio>;
}
