//! # deskmind Core
//!
//! Domain types, traits, and error definitions for the deskmind agent runtime.
//! This crate has no HTTP or storage dependencies. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is a trait here:
//! - [`Provider`]: the language-model endpoint
//! - [`ToolProvider`]: the external tool capability
//! - [`RetrievalIndex`]: the document index used for grounded answers
//!
//! Implementations live in their respective crates, so the loop can be
//! exercised against scripted stand-ins in tests.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, RetrievalError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationId, ConversationMemory, Message, Role, ToolCallRequest};
pub use provider::{EmbeddingRequest, EmbeddingResponse, ModelTurn, Provider, ProviderRequest, Usage};
pub use retrieval::{
    ClearReport, IndexReport, IndexStats, RetrievalAnswer, RetrievalIndex, Source, compose_question,
};
pub use schema::{FunctionSpec, format_tools};
pub use tool::{Tool, ToolDescriptor, ToolOutcome, ToolProvider, ToolRegistry, ToolResult};
