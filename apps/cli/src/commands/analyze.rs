//! Exposure analysis of a broker export.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use folioscope_core::lookup::{AllocationLookupService, AllocationProvider};
use folioscope_core::portfolio::{ExposureService, ExposureServiceTrait, PortfolioExposure, PortfolioType};
use folioscope_providers::{MockAllocationProvider, OpenAiAllocationProvider, OpenAiConfig};

use super::source::open_source;
use crate::config::{Config, ProviderKind};

/// Arguments for the analyze command
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Broker export file
    pub file: PathBuf,

    /// Data source identifier (see `folioscope sources`)
    #[arg(short, long, default_value = "etrade-csv")]
    pub source: String,

    /// Account type, e.g. "Roth IRA" or "solo-401k"
    #[arg(short = 't', long)]
    pub portfolio_type: Option<String>,

    /// Allocation provider (overrides FOLIOSCOPE_PROVIDER)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn build_provider(kind: ProviderKind, config: &Config) -> Result<Arc<dyn AllocationProvider>> {
    Ok(match kind {
        ProviderKind::Mock => Arc::new(MockAllocationProvider::new()),
        ProviderKind::OpenAi => {
            let mut openai = OpenAiConfig::from_env().context("OpenAI provider is not configured")?;
            openai.request_timeout = config.lookup_timeout;
            Arc::new(OpenAiAllocationProvider::new(openai))
        }
    })
}

/// Parses the export, completes it against the provider and builds the report.
pub async fn exposure(args: &AnalyzeArgs, config: &Config) -> Result<PortfolioExposure> {
    let source = open_source(&args.file, &args.source)?;
    if !source.validate() {
        bail!(
            "{} is not a valid {} file",
            args.file.display(),
            source.source_type().display_name()
        );
    }

    let mut portfolio = source.get_portfolio()?;
    if let Some(portfolio_type) = &args.portfolio_type {
        let portfolio_type: PortfolioType = portfolio_type.parse()?;
        portfolio.set_portfolio_type(Some(portfolio_type));
    }

    let provider = build_provider(args.provider.unwrap_or(config.provider), config)?;
    info!(
        "Analyzing '{}' ({} holdings) with provider {}",
        portfolio.account_name(),
        portfolio.holdings().len(),
        provider.id()
    );

    let lookup = Arc::new(AllocationLookupService::with_config(
        provider,
        config.lookup_config(),
    ));
    let service = ExposureService::new(lookup);
    let exposure = service.get_portfolio_exposure(&mut portfolio).await;

    for issue in &exposure.issues {
        warn!("{}: {}", issue.subject, issue.message);
    }
    Ok(exposure)
}

pub async fn run(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let exposure = exposure(&args, config).await?;
    let json = serde_json::to_string_pretty(&exposure)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
