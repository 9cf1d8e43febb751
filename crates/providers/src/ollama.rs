//! Ollama native API provider.
//!
//! Talks to a local Ollama daemon:
//! - `POST /api/chat` with `stream: false` for one complete turn
//! - `POST /api/embed` for embeddings
//! - `GET /api/tags` for model listing and health checks
//!
//! Ollama returns tool-call arguments as JSON objects (some models emit
//! JSON-encoded strings instead) and often omits tool-call ids.

use async_trait::async_trait;
use deskmind_core::error::ProviderError;
use deskmind_core::message::{Message, ToolCallRequest};
use deskmind_core::provider::*;
use deskmind_core::schema::FunctionSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{api_error, decode_body, http_client, synthesize_call_id, transport_error};

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    /// Local daemon on the default port with the default 120 s timeout.
    pub fn local() -> Result<Self, ProviderError> {
        Self::new("http://localhost:11434", Duration::from_secs(120))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|tc| OllamaToolCall {
                        id: tc.id.clone(),
                        function: OllamaFunctionCall {
                            name: tc.name.clone(),
                            arguments: arguments_object(&tc.arguments),
                        },
                    })
                    .collect(),
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> OllamaChatRequest<'_> {
        OllamaChatRequest {
            model: &request.model,
            messages: Self::to_api_messages(&request.messages),
            tools: &request.tools,
            stream: false,
            options: request.temperature.map(|temperature| OllamaOptions { temperature }),
        }
    }
}

/// Ollama wants an object back, not the encoded string. Anything that does
/// not decode to an object is replaced by `{}`.
fn arguments_object(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

/// Arguments arrive either as an object or as a JSON-encoded string.
fn normalize_arguments(arguments: Value) -> String {
    match arguments {
        Value::String(s) => s,
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ModelTurn, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending Ollama chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            warn!(error = %err, "Ollama returned error");
            return Err(err);
        }

        let api_response: OllamaChatResponse = decode_body(response).await?;

        let tool_calls = api_response
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let id = tc.id.filter(|id| !id.is_empty()).unwrap_or_else(synthesize_call_id);
                ToolCallRequest::new(id, tc.function.name, normalize_arguments(tc.function.arguments))
            })
            .collect();

        let usage = match (api_response.prompt_eval_count, api_response.eval_count) {
            (None, None) => None,
            (prompt, completion) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = completion.unwrap_or(0);
                Some(Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                })
            }
        };

        Ok(ModelTurn {
            content: api_response.message.content,
            tool_calls,
            model: api_response.model.unwrap_or(request.model),
            usage,
        })
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let url = format!("{}/api/embed", self.base_url);

        debug!(
            model = %request.model,
            count = request.inputs.len(),
            "Sending Ollama embedding request"
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": request.model,
                "input": request.inputs,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let api_response: OllamaEmbedResponse = decode_body(response).await?;

        if api_response.embeddings.len() != request.inputs.len() {
            return Err(ProviderError::Protocol(format!(
                "Expected {} embeddings, got {}",
                request.inputs.len(),
                api_response.embeddings.len()
            )));
        }

        Ok(EmbeddingResponse {
            embeddings: api_response.embeddings,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let tags: OllamaTagsResponse = decode_body(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        Ok(response.status().is_success())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "<[FunctionSpec]>::is_empty")]
    tools: &'a [FunctionSpec],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OllamaFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    model: Option<String>,
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}
