//! OpenAI-compatible client configuration.
//!
//! The same client type talks to OpenAI itself or to a local Ollama server
//! through its `/v1` compatibility endpoint.

use crate::error::{Result, VidragError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for `base_url` with the configured timeout.
pub fn create_client(base_url: &str, api_key: Option<&str>) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client with a custom timeout.
fn create_client_with_timeout(
    base_url: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    url::Url::parse(base_url).map_err(|e| {
        VidragError::Configuration(format!("Invalid API base URL {}: {}", base_url, e))
    })?;

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidragError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

    // Ollama accepts any bearer token; OpenAI requires the real one.
    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key.unwrap_or("ollama"));

    Ok(Client::with_config(config).with_http_client(http_client))
}
