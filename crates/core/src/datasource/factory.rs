use super::datasource_traits::{DataSourceType, HoldingsSource};
use super::etrade::ETradeCsvDataSource;
use crate::errors::Result;

/// Identifiers of every supported source.
pub fn data_source_options() -> Vec<&'static str> {
    DataSourceType::ALL.iter().map(|t| t.value()).collect()
}

/// Display name for a source identifier.
pub fn data_source_display_name(value: &str) -> Result<&'static str> {
    Ok(value.parse::<DataSourceType>()?.display_name())
}

/// Builds the parser for `kind` over the raw file contents.
pub fn data_source_factory(kind: DataSourceType, content: Vec<u8>) -> Box<dyn HoldingsSource> {
    match kind {
        DataSourceType::ETradeCsv => Box::new(ETradeCsvDataSource::new(content)),
    }
}
