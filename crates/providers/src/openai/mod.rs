//! OpenAI-backed allocation provider.
//!
//! Asks a chat completions model for a security's allocation breakdown
//! through a forced tool call, so the answer arrives as JSON arguments that
//! match a schema derived from the taxonomy metadata.
//!
//! # Configuration
//!
//! - `OPENAI_API_KEY` (required, starts with `sk-`)
//! - `FOLIOSCOPE_OPENAI_MODEL` (default `gpt-4o-mini`)
//! - `FOLIOSCOPE_OPENAI_BASE_URL` (default `https://api.openai.com/v1`)

mod models;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use folioscope_core::errors::ProviderError;
use folioscope_core::lookup::AllocationProvider;
use folioscope_core::securities::SecurityAllocation;

use crate::errors::ProviderConfigError;
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use models::{
    allocation_schema, AllocationPayload, ChatMessage, ChatRequest, ChatResponse, FunctionDef,
    Tool, ToolChoice, ToolChoiceFunction, TOOL_NAME,
};

const PROVIDER_ID: &str = "OPENAI";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

const SYSTEM_PROMPT: &str = "You are a financial data assistant. Answer with the \
security's composition as integer percentages. Every group of percentages must add \
up to exactly 100. If a fund is a blend, split growth and value 50/50. If regional \
data is insufficient, put 100 in global.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub requests_per_minute: u32,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderConfigError> {
        let api_key = api_key.into();
        if !Self::validate_api_key(&api_key) {
            return Err(ProviderConfigError::InvalidApiKey);
        }
        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn validate_api_key(api_key: &str) -> bool {
        api_key.starts_with("sk-")
    }

    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ProviderConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderConfigError::MissingEnv("OPENAI_API_KEY".to_string()))?;
        let mut config = Self::new(api_key)?;

        if let Ok(model) = std::env::var("FOLIOSCOPE_OPENAI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("FOLIOSCOPE_OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }
}

/// LLM-backed [`AllocationProvider`].
///
/// # Example
///
/// ```ignore
/// let provider = OpenAiAllocationProvider::new(OpenAiConfig::from_env()?);
/// let allocation = provider.lookup_allocation("VTI").await?;
/// ```
pub struct OpenAiAllocationProvider {
    client: Client,
    config: OpenAiConfig,
    limiter: RateLimiter,
}

impl OpenAiAllocationProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let limiter = RateLimiter::new(
            PROVIDER_ID,
            RateLimitConfig {
                requests_per_minute: config.requests_per_minute,
                ..Default::default()
            },
        );

        Self {
            client,
            config,
            limiter,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, symbol: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Give me the allocation breakdown for {}: name, security type, \
                         expense ratio, fund assets (stocks, bonds, real estate, cash), \
                         market cap, US vs international, region, growth vs value, \
                         economic status and GICS sectors.",
                        symbol
                    ),
                },
            ],
            tools: vec![Tool {
                kind: "function",
                function: FunctionDef {
                    name: TOOL_NAME,
                    description: "Record the allocation breakdown of a security",
                    parameters: allocation_schema(),
                },
            }],
            tool_choice: ToolChoice {
                kind: "function",
                function: ToolChoiceFunction { name: TOOL_NAME },
            },
            temperature: 0.0,
        }
    }

    async fn fetch(&self, symbol: &str) -> Result<String, ProviderError> {
        self.limiter.acquire().await;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request(symbol))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                        timeout: self.config.request_timeout,
                    }
                } else {
                    ProviderError::Network {
                        provider: PROVIDER_ID.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        // Check for other HTTP errors
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP error: {}", response.status()),
            });
        }

        response.text().await.map_err(|e| ProviderError::Network {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    fn parse_response(body: &str, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        let invalid = |message: String| ProviderError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            message,
        };

        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| invalid(format!("malformed body: {}", e)))?;

        let call = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls.into_iter().next())
            .ok_or_else(|| invalid("response has no tool call".to_string()))?;

        if call.function.name != TOOL_NAME {
            warn!("Unexpected tool '{}' in OpenAI response", call.function.name);
        }

        let payload: AllocationPayload = serde_json::from_str(&call.function.arguments)
            .map_err(|e| invalid(format!("malformed tool arguments: {}", e)))?;

        Ok(payload.into_allocation(symbol)?)
    }
}

#[async_trait]
impl AllocationProvider for OpenAiAllocationProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn lookup_allocation(&self, symbol: &str) -> Result<SecurityAllocation, ProviderError> {
        debug!("Requesting allocation for {} from {}", symbol, self.config.model);
        let body = self.fetch(symbol).await?;
        Self::parse_response(&body, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_must_start_with_sk() {
        assert_eq!(
            OpenAiConfig::new("pk-123").unwrap_err(),
            ProviderConfigError::InvalidApiKey
        );
        let config = OpenAiConfig::new("sk-test").unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_forces_tool_call() {
        let provider = OpenAiAllocationProvider::new(OpenAiConfig::new("sk-test").unwrap());
        let request = serde_json::to_value(provider.build_request("VTI")).unwrap();

        assert_eq!(request["tool_choice"]["function"]["name"], TOOL_NAME);
        assert_eq!(request["tools"][0]["type"], "function");
        assert!(request["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("VTI"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = OpenAiConfig::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:1234/v1/");
        let provider = OpenAiAllocationProvider::new(config);
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_response_without_tool_call_is_invalid() {
        let body = r#"{"choices":[{"message":{"content":"I cannot help"}}]}"#;
        let err = OpenAiAllocationProvider::parse_response(body, "VTI").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }
}
