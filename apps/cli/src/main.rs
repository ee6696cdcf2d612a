//! # Folioscope CLI
//!
//! Reads a broker export, looks up allocation data for every holding and
//! prints the portfolio's exposure report as JSON.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use commands::{analyze, source};
use config::{Config, LogFormat};

/// Folioscope - portfolio exposure across asset class, region, sector and more
#[derive(Parser)]
#[command(name = "folioscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the exposure report for a broker export
    Analyze(analyze::AnalyzeArgs),

    /// Check whether a file matches a data source format
    Validate(source::ValidateArgs),

    /// List supported data sources
    Sources,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    match cli.command {
        Commands::Analyze(args) => analyze::run(args, &config).await?,
        Commands::Validate(args) => {
            if !source::validate(args)? {
                std::process::exit(1);
            }
        }
        Commands::Sources => source::list_sources(),
    }

    Ok(())
}
