//! The agent loop: the heart of deskmind.
//!
//! A user turn follows an **Ask → Act → Observe** cycle:
//!
//! 1. **Receive** a user message (from the gateway or the CLI)
//! 2. **Retrieve** an answer from the document index, when asked to
//! 3. **Send to the model** with the current tool list
//! 4. **If tool calls**: execute them in order, record the results, go back to 3
//! 5. **If text**: commit the turn to the conversation and return it
//!
//! The loop ends when the model answers without tool calls, or fails once
//! the configured number of tool rounds is exhausted.

pub mod dispatcher;
pub mod loop_runner;
pub mod selector;
pub mod service;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{ToolDispatcher, parse_arguments};
pub use loop_runner::{AgentLoop, GenerateResult};
pub use selector::{ChatOutcome, RetrievalSelector};
pub use service::AgentService;
pub use session::{SessionHandle, SessionRegistry};
