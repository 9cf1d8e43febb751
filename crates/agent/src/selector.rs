//! Retrieval-augmented response selection.
//!
//! A question is answered from the document index when retrieval is
//! requested and available; any retrieval failure falls back to the plain
//! agent loop without surfacing an error.

use chrono::Utc;
use deskmind_core::error::Result;
use deskmind_core::event::{DomainEvent, EventBus};
use deskmind_core::message::ConversationId;
use deskmind_core::retrieval::{RetrievalIndex, Source};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::loop_runner::AgentLoop;
use crate::session::SessionRegistry;

/// The answer to one chat request.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response_text: String,
    pub model_used: String,
    /// Present only when the answer came from the index
    pub sources: Option<Vec<Source>>,
    pub conversation_id: ConversationId,
}

pub struct RetrievalSelector {
    agent: Arc<AgentLoop>,
    sessions: Arc<SessionRegistry>,
    retrieval: Option<Arc<dyn RetrievalIndex>>,
    event_bus: Arc<EventBus>,
}

impl RetrievalSelector {
    pub fn new(
        agent: Arc<AgentLoop>,
        sessions: Arc<SessionRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            agent,
            sessions,
            retrieval: None,
            event_bus,
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalIndex>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn retrieval(&self) -> Option<&Arc<dyn RetrievalIndex>> {
        self.retrieval.as_ref()
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub async fn answer(
        &self,
        question: &str,
        use_retrieval: bool,
        model: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome> {
        let model_used = model.unwrap_or(self.agent.default_model()).to_string();
        let (conversation_id, session) = self.sessions.session(conversation_id).await;

        if use_retrieval && let Some(retrieval) = &self.retrieval {
            match retrieval.retrieve_and_answer(question, None).await {
                Ok(answer) if answer.success => {
                    debug!(sources = answer.sources.len(), "Answered from the index");
                    return Ok(ChatOutcome {
                        response_text: answer.response_text,
                        model_used,
                        sources: Some(answer.sources),
                        conversation_id,
                    });
                }
                Ok(answer) => {
                    let reason = answer.error.unwrap_or_else(|| "no answer".into());
                    self.fall_back(reason);
                }
                Err(e) => self.fall_back(e.to_string()),
            }
        }

        let mut memory = session.lock().await;
        let result = self.agent.generate(&mut memory, question, model).await?;

        Ok(ChatOutcome {
            response_text: result.message.content,
            model_used,
            sources: None,
            conversation_id,
        })
    }

    fn fall_back(&self, reason: String) {
        warn!(reason = %reason, "Retrieval failed, falling back to the agent");
        self.event_bus.publish(DomainEvent::RetrievalFallback {
            reason,
            timestamp: Utc::now(),
        });
    }
}
