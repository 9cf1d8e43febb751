//! Shared test helpers: scripted providers, stub tools and a stub index.

use async_trait::async_trait;
use deskmind_core::error::{ProviderError, RetrievalError, ToolError};
use deskmind_core::message::ToolCallRequest;
use deskmind_core::provider::{ModelTurn, Provider, ProviderRequest, Usage};
use deskmind_core::retrieval::*;
use deskmind_core::tool::{ToolDescriptor, ToolProvider};
use serde_json::{Map, Value, json};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted turns.
///
/// Each call to `complete` returns the next turn in the queue and records
/// the request it was given. Panics if more calls are made than turns provided.
pub struct SequentialMockProvider {
    turns: Mutex<Vec<Result<ModelTurn, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self::scripted(turns.into_iter().map(Ok).collect())
    }

    pub fn scripted(turns: Vec<Result<ModelTurn, ProviderError>>) -> Self {
        Self {
            turns: Mutex::new(turns),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text turn (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_turn(text)])
    }

    /// Create a provider that first requests tool calls, then answers.
    pub fn tool_then_answer(tool_calls: Vec<ToolCallRequest>, answer: &str) -> Self {
        Self::new(vec![make_tool_call_turn(tool_calls), make_text_turn(answer)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ModelTurn, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let turns = self.turns.lock().unwrap();
        let index = requests.len();

        if index >= turns.len() {
            panic!(
                "SequentialMockProvider: no more turns (call #{index}, have {})",
                turns.len()
            );
        }

        requests.push(request);
        turns[index].clone()
    }
}

/// A plain text turn.
pub fn make_text_turn(text: &str) -> ModelTurn {
    ModelTurn {
        content: text.to_string(),
        tool_calls: Vec::new(),
        model: "mock-model".into(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// A turn that only requests tool calls.
pub fn make_tool_call_turn(tool_calls: Vec<ToolCallRequest>) -> ModelTurn {
    ModelTurn {
        tool_calls,
        ..make_text_turn("")
    }
}

/// A tool call with id `call_<name>`.
pub fn make_tool_call(name: &str, args: Value) -> ToolCallRequest {
    ToolCallRequest::new(format!("call_{name}"), name, args.to_string())
}

/// Tools `echo` (returns its arguments) and `fail` (always fails).
///
/// Listed unsorted on purpose; every `call_tool` is recorded.
pub struct EchoTools {
    calls: Mutex<Vec<(String, Value)>>,
}

impl EchoTools {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolProvider for EchoTools {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(vec![
            ToolDescriptor::new("fail").with_description("Always fails"),
            ToolDescriptor::new("echo")
                .with_description("Echo the arguments back")
                .with_schema(json!({"type": "object"})),
        ])
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));

        match name {
            "echo" => Ok(arguments),
            "fail" => Err(ToolError::ExecutionFailed {
                tool_name: name.into(),
                reason: "disk on fire".into(),
            }),
            other => Err(ToolError::NotFound(other.into())),
        }
    }
}

/// A retrieval index that always gives the same answer.
pub struct StubIndex {
    answer: Result<RetrievalAnswer, RetrievalError>,
    questions: Mutex<Vec<String>>,
}

impl StubIndex {
    pub fn answering(text: &str) -> Self {
        let source = Source {
            text: "Electron apps have a main process...".into(),
            score: Some(0.87),
            metadata: Map::new(),
        };
        Self::with(Ok(RetrievalAnswer::answered(text, vec![source])))
    }

    pub fn empty() -> Self {
        Self::with(Ok(RetrievalAnswer::failed(
            "No documents indexed. Please index documents first.",
        )))
    }

    pub fn broken() -> Self {
        Self::with(Err(RetrievalError::Storage("index unreadable".into())))
    }

    fn with(answer: Result<RetrievalAnswer, RetrievalError>) -> Self {
        Self {
            answer,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalIndex for StubIndex {
    async fn retrieve_and_answer(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<RetrievalAnswer, RetrievalError> {
        self.questions
            .lock()
            .unwrap()
            .push(compose_question(question, context));
        self.answer.clone()
    }

    async fn index_files(&self, paths: &[String]) -> Result<IndexReport, RetrievalError> {
        Ok(IndexReport {
            success: true,
            indexed_count: paths.len(),
            chars: None,
            files: paths.to_vec(),
            error: None,
        })
    }

    async fn index_text(
        &self,
        text: &str,
        _metadata: Map<String, Value>,
    ) -> Result<IndexReport, RetrievalError> {
        Ok(IndexReport {
            success: true,
            indexed_count: 1,
            chars: Some(text.chars().count()),
            files: Vec::new(),
            error: None,
        })
    }

    async fn clear(&self) -> Result<ClearReport, RetrievalError> {
        Ok(ClearReport {
            success: true,
            message: Some("All indexed documents cleared".into()),
            error: None,
        })
    }

    async fn stats(&self) -> Result<IndexStats, RetrievalError> {
        Ok(IndexStats {
            document_count: 0,
            collection_name: "electron_docs".into(),
            embedding_model: "nomic-embed-text".into(),
            llm_model: "llama3.2:1b".into(),
        })
    }
}
