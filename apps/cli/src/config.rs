use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use folioscope_core::lookup::LookupConfig;

/// Allocation provider selected for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Deterministic synthetic data, no network access
    Mock,
    /// OpenAI chat completions (needs OPENAI_API_KEY)
    #[value(name = "openai")]
    OpenAi,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            other => bail!("Unknown provider '{}', expected 'mock' or 'openai'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: ProviderKind,
    pub max_in_flight: usize,
    pub lookup_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        let lookup = LookupConfig::default();
        Self {
            provider: ProviderKind::Mock,
            max_in_flight: lookup.max_in_flight,
            lookup_timeout: lookup.request_timeout,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the `FOLIOSCOPE_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = var("FOLIOSCOPE_PROVIDER") {
            config.provider = provider.parse()?;
        }
        if let Some(value) = var("FOLIOSCOPE_MAX_IN_FLIGHT") {
            let max_in_flight: usize = value
                .trim()
                .parse()
                .with_context(|| format!("FOLIOSCOPE_MAX_IN_FLIGHT must be a number, got '{}'", value))?;
            config.max_in_flight = max_in_flight.max(1);
        }
        if let Some(value) = var("FOLIOSCOPE_LOOKUP_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().with_context(|| {
                format!("FOLIOSCOPE_LOOKUP_TIMEOUT_SECS must be a number, got '{}'", value)
            })?;
            config.lookup_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = var("FOLIOSCOPE_LOG_FORMAT") {
            config.log_format = if value.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Text
            };
        }

        Ok(config)
    }

    pub fn lookup_config(&self) -> LookupConfig {
        LookupConfig::default()
            .with_max_in_flight(self.max_in_flight)
            .with_request_timeout(self.lookup_timeout)
    }
}
