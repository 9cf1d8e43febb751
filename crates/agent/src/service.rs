//! The agent service: the one entry point the gateway and CLI call.

use chrono::Utc;
use deskmind_config::AppConfig;
use deskmind_core::error::{Error, Result};
use deskmind_core::event::{DomainEvent, EventBus};
use deskmind_core::retrieval::*;
use deskmind_core::tool::{ToolDescriptor, ToolProvider};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::loop_runner::AgentLoop;
use crate::selector::{ChatOutcome, RetrievalSelector};
use crate::session::SessionRegistry;

pub struct AgentService {
    selector: RetrievalSelector,
    tools: Arc<dyn ToolProvider>,
    event_bus: Arc<EventBus>,
}

impl AgentService {
    pub fn new(
        agent: Arc<AgentLoop>,
        tools: Arc<dyn ToolProvider>,
        sessions: Arc<SessionRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            selector: RetrievalSelector::new(agent, sessions, event_bus.clone()),
            tools,
            event_bus,
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalIndex>) -> Self {
        self.selector = self.selector.with_retrieval(retrieval);
        self
    }

    /// Wire provider, tools, sessions and (when enabled) the retrieval
    /// index from configuration.
    ///
    /// A retrieval index that cannot be opened is logged and left out.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let router = deskmind_providers::build_from_config(config)?;
        let provider = router.primary()?;
        let tools: Arc<dyn ToolProvider> =
            Arc::new(deskmind_tools::registry_from_config(&config.tools)?);
        let event_bus = Arc::new(EventBus::default());

        let agent = AgentLoop::new(
            provider.clone(),
            tools.clone(),
            &config.provider.default_model,
            event_bus.clone(),
        )
        .with_config(&config.agent);

        let sessions = Arc::new(SessionRegistry::new(config.sessions.max_sessions));
        let mut service = Self::new(Arc::new(agent), tools, sessions, event_bus);

        if config.retrieval.enabled {
            match deskmind_retrieval::RagEngine::open(provider, &config.retrieval).await {
                Ok(engine) => service = service.with_retrieval(Arc::new(engine)),
                Err(e) => warn!(error = %e, "Retrieval index unavailable, continuing without it"),
            }
        }

        Ok(service)
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        self.selector.sessions()
    }

    pub fn default_model(&self) -> &str {
        self.selector.agent().default_model()
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.selector.retrieval().is_some()
    }

    fn index(&self) -> Result<&Arc<dyn RetrievalIndex>> {
        self.selector.retrieval().ok_or_else(|| Error::Config {
            message: "Retrieval index not initialized".into(),
        })
    }

    /// Answer one user message, from the index or the agent loop.
    pub async fn chat(
        &self,
        message: &str,
        model: Option<&str>,
        use_retrieval: bool,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome> {
        self.selector
            .answer(message, use_retrieval, model, conversation_id)
            .await
    }

    /// Available tools, sorted by name.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = self.tools.list_tools().await?;
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tools)
    }

    pub async fn index_documents(&self, paths: &[String]) -> Result<IndexReport> {
        let report = self.index()?.index_files(paths).await?;
        if report.success {
            info!(documents = report.indexed_count, "Documents indexed");
            self.event_bus.publish(DomainEvent::DocumentsIndexed {
                count: report.indexed_count,
                timestamp: Utc::now(),
            });
        }
        Ok(report)
    }

    pub async fn index_text(
        &self,
        text: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<IndexReport> {
        let report = self
            .index()?
            .index_text(text, metadata.unwrap_or_default())
            .await?;
        if report.success {
            self.event_bus.publish(DomainEvent::DocumentsIndexed {
                count: report.indexed_count,
                timestamp: Utc::now(),
            });
        }
        Ok(report)
    }

    pub async fn query_index(&self, question: &str, context: Option<&str>) -> Result<RetrievalAnswer> {
        Ok(self.index()?.retrieve_and_answer(question, context).await?)
    }

    pub async fn clear_index(&self) -> Result<ClearReport> {
        Ok(self.index()?.clear().await?)
    }

    pub async fn index_stats(&self) -> Result<IndexStats> {
        Ok(self.index()?.stats().await?)
    }
}
