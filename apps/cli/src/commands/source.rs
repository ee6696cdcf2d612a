//! Data source commands: format validation and listing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use folioscope_core::datasource::{data_source_factory, DataSourceType, HoldingsSource};

/// Arguments for the validate command
#[derive(Parser)]
pub struct ValidateArgs {
    /// Broker export file
    pub file: PathBuf,

    /// Data source identifier (see `folioscope sources`)
    #[arg(short, long, default_value = "etrade-csv")]
    pub source: String,
}

/// Reads `path` and wraps it in the parser for `source`.
pub fn open_source(path: &Path, source: &str) -> Result<Box<dyn HoldingsSource>> {
    let kind: DataSourceType = source.parse()?;
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    Ok(data_source_factory(kind, content))
}

pub fn validate(args: ValidateArgs) -> Result<bool> {
    let source = open_source(&args.file, &args.source)?;
    let valid = source.validate();

    if valid {
        info!("{} is a valid {} file", args.file.display(), source.source_type().display_name());
        println!("valid");
    } else {
        println!(
            "invalid: {} is not a {} file",
            args.file.display(),
            source.source_type().display_name()
        );
    }
    Ok(valid)
}

pub fn list_sources() {
    for kind in DataSourceType::ALL {
        println!("{:<12} {}", kind.value(), kind.display_name());
    }
}
