//! The agent reasoning loop implementation.

use chrono::Utc;
use deskmind_config::{AgentConfig, ToolFailurePolicy};
use deskmind_core::error::{Error, Result};
use deskmind_core::event::{DomainEvent, EventBus};
use deskmind_core::message::{ConversationMemory, Message};
use deskmind_core::provider::{Provider, ProviderRequest};
use deskmind_core::schema::{FunctionSpec, format_tools};
use deskmind_core::tool::ToolProvider;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::dispatcher::ToolDispatcher;

/// The final assistant message of a turn and the model that produced it.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub message: Message,
    pub model: String,
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tool dispatch, including the failure policy
    dispatcher: ToolDispatcher,

    /// Model used when the caller does not name one
    default_model: String,

    /// Prepended to every request, never stored in memory
    system_prompt: String,

    /// Temperature setting
    temperature: Option<f32>,

    /// Maximum tool rounds per turn
    max_tool_rounds: u32,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolProvider>,
        default_model: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let defaults = AgentConfig::default();
        Self {
            provider,
            dispatcher: ToolDispatcher::new(tools),
            default_model: default_model.into(),
            system_prompt: defaults.system_prompt,
            temperature: defaults.temperature,
            max_tool_rounds: defaults.max_tool_rounds,
            event_bus,
        }
    }

    /// Apply the `[agent]` section of the configuration.
    pub fn with_config(self, config: &AgentConfig) -> Self {
        self.with_system_prompt(&config.system_prompt)
            .with_temperature(config.temperature)
            .with_max_tool_rounds(config.max_tool_rounds)
            .with_failure_policy(config.tool_failure_policy)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tool rounds per turn (at least 1).
    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.dispatcher = self.dispatcher.with_policy(policy);
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Run one user turn against `memory`.
    ///
    /// Messages produced during the turn are committed to `memory` only when
    /// the model gives its final answer. On any error `memory` is unchanged.
    pub async fn generate(
        &self,
        memory: &mut ConversationMemory,
        text: &str,
        model: Option<&str>,
    ) -> Result<GenerateResult> {
        let model = model.unwrap_or(&self.default_model);
        info!(
            conversation_id = %memory.id,
            model,
            history = memory.len(),
            "Processing turn"
        );

        match self.run_turn(memory, text, model).await {
            Ok((staged, result)) => {
                memory.append_all(staged)?;
                Ok(result)
            }
            Err(e) => {
                warn!(conversation_id = %memory.id, error = %e, "Turn failed");
                self.event_bus.publish(DomainEvent::TurnFailed {
                    conversation_id: memory.id.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Like [`generate`](Self::generate), returning only the final text.
    pub async fn generate_text(
        &self,
        memory: &mut ConversationMemory,
        text: &str,
        model: Option<&str>,
    ) -> Result<String> {
        Ok(self.generate(memory, text, model).await?.message.content)
    }

    async fn run_turn(
        &self,
        memory: &ConversationMemory,
        text: &str,
        model: &str,
    ) -> Result<(Vec<Message>, GenerateResult)> {
        let conversation_id = memory.id.to_string();
        let user = Message::user(text);
        user.validate()?;
        let mut staged = vec![user];
        let mut rounds: u32 = 0;

        loop {
            // ── AWAITING_MODEL ──
            let request = ProviderRequest::new(model, self.context(memory, &staged))
                .with_tools(self.current_tools().await)
                .with_temperature(self.temperature);

            let turn = self.provider.complete(request).await?;

            debug!(
                conversation_id = %conversation_id,
                round = rounds + 1,
                tool_calls = turn.tool_calls.len(),
                "Model turn completed"
            );
            self.event_bus.publish(DomainEvent::ModelTurnCompleted {
                conversation_id: conversation_id.clone(),
                model: turn.model.clone(),
                round: rounds + 1,
                tool_calls: turn.tool_calls.len(),
                timestamp: Utc::now(),
            });

            if !turn.has_tool_calls() {
                // ── DONE ──
                let model_id = if turn.model.is_empty() {
                    model.to_string()
                } else {
                    turn.model.clone()
                };
                let message = turn.into_message();
                staged.push(message.clone());
                return Ok((
                    staged,
                    GenerateResult {
                        message,
                        model: model_id,
                    },
                ));
            }

            if rounds >= self.max_tool_rounds {
                return Err(Error::LoopLimitExceeded {
                    rounds: self.max_tool_rounds,
                });
            }
            rounds += 1;

            // ── EXECUTING_TOOLS ──
            let calls = turn.tool_calls.clone();
            staged.push(turn.into_message());

            for call in &calls {
                let start = Instant::now();
                let result = self.dispatcher.execute(call).await?;
                let duration_ms = start.elapsed().as_millis() as u64;

                self.event_bus.publish(DomainEvent::ToolExecuted {
                    conversation_id: conversation_id.clone(),
                    tool_name: call.name.clone(),
                    success: result.is_success(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                staged.push(Message::tool_result(&call.id, result.to_content()));
            }
        }
    }

    /// System prompt + committed history + this turn's staged messages.
    fn context(&self, memory: &ConversationMemory, staged: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(memory.len() + staged.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(&self.system_prompt));
        }
        messages.extend_from_slice(memory.messages());
        messages.extend_from_slice(staged);
        messages
    }

    /// Tools are re-listed every round; a listing failure means no tools this round.
    async fn current_tools(&self) -> Vec<FunctionSpec> {
        match self.dispatcher.list().await {
            Ok(descriptors) => format_tools(&descriptors),
            Err(e) => {
                warn!(error = %e, "Could not list tools, continuing without them");
                Vec::new()
            }
        }
    }
}
