//! Holdings sources: broker export parsers that produce populated portfolios.

mod datasource_traits;
mod etrade;
mod factory;

pub use datasource_traits::{DataSourceType, HoldingsSource};
pub use etrade::{ETradeCsvDataSource, ETRADE_SOURCE_LABEL};
pub use factory::{data_source_display_name, data_source_factory, data_source_options};
