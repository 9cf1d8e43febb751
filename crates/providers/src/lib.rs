//! Language-model provider implementations for deskmind.
//!
//! All providers implement the `deskmind_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};

use deskmind_core::error::ProviderError;
use std::time::Duration;

/// Build the shared HTTP client with the request timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

/// Classify a reqwest failure that happened before a response arrived.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Transport(e.to_string())
    }
}

/// Turn a non-success response into an `ApiError`, keeping the body text.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status_code = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::ApiError {
        status_code,
        message,
    }
}

/// Read the body and decode it, separating wire failures from shape failures.
pub(crate) async fn decode_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::Protocol(format!("Failed to parse response: {e}")))
}

/// Id for a tool call the model emitted without one.
pub(crate) fn synthesize_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}
