//! Error types for the deskmind domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator of the agent loop has its own error enum.

use thiserror::Error;

/// The top-level error type for all deskmind operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model endpoint ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tools ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Retrieval index ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Agent loop ---
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Tool loop exceeded {rounds} rounds without a final answer")]
    LoopLimitExceeded { rounds: u32 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

/// Failures talking to the language-model endpoint.
///
/// None of these are retried automatically.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, broken pipe.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// The endpoint answered but the body did not have the expected shape.
    #[error("Malformed model response: {0}")]
    Protocol(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the failure happened on the wire rather than in the payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::ApiError { .. }
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name} — {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Argument errors are always recorded as tool results, never fatal.
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Answer generation failed: {0}")]
    Generation(String),
}
