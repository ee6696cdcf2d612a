//! Provider configuration errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfigError {
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    #[error("Invalid OpenAI API key: keys start with 'sk-'")]
    InvalidApiKey,
}
