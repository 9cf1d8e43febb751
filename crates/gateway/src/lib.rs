//! HTTP API gateway for deskmind.
//!
//! Exposes the agent to the desktop shell: health checks, tool listing,
//! chat (with optional retrieval), and the document index endpoints under
//! `/rag`.
//!
//! Built on Axum.

use axum::extract::{DefaultBodyLimit, Multipart};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use deskmind_agent::AgentService;
use deskmind_config::AppConfig;
use deskmind_core::retrieval::{IndexStats, RetrievalAnswer, Source};
use deskmind_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Uploads larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub service: Arc<AgentService>,
    /// Where uploaded files are saved before indexing
    pub upload_dir: PathBuf,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// CORS is fully permissive: the desktop shell loads from `file://` and
/// local dev servers.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/tools", get(tools_handler))
        .route("/chat", post(chat_handler))
        .route("/rag/index", post(rag_index_handler))
        .route("/rag/index-text", post(rag_index_text_handler))
        .route("/rag/query", post(rag_query_handler))
        .route("/rag/upload", post(rag_upload_handler))
        .route("/rag/clear", delete(rag_clear_handler))
        .route("/rag/stats", get(rag_stats_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let service = Arc::new(AgentService::from_config(&config).await?);

    let state = Arc::new(GatewayState {
        service,
        upload_dir: config.gateway.upload_dir.clone(),
    });
    let app = build_router(state);

    info!(addr = %addr, model = %config.provider.default_model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

/// An error response: `{"detail": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn rag_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "RAG service not initialized")
    }
}

impl From<deskmind_core::Error> for ApiError {
    fn from(e: deskmind_core::Error) -> Self {
        error!(error = %e, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn require_rag(state: &GatewayState) -> Result<(), ApiError> {
    if state.service.retrieval_enabled() {
        Ok(())
    } else {
        Err(ApiError::rag_unavailable())
    }
}

// --- Handlers ---

async fn root_handler() -> Json<Value> {
    Json(json!({ "status": "running", "service": "deskmind" }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolDescriptor>,
}

async fn tools_handler(State(state): State<SharedState>) -> ApiResult<ToolsResponse> {
    let tools = state.service.list_tools().await?;
    Ok(Json(ToolsResponse { tools }))
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    use_rag: Option<bool>,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    model_used: String,
    sources: Option<Vec<Source>>,
    conversation_id: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    info!(
        message_len = payload.message.len(),
        use_rag = payload.use_rag.unwrap_or(false),
        "Chat request received"
    );

    let outcome = state
        .service
        .chat(
            &payload.message,
            payload.model.as_deref(),
            payload.use_rag.unwrap_or(false),
            payload.conversation_id.as_deref(),
        )
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response_text,
        model_used: outcome.model_used,
        sources: outcome.sources,
        conversation_id: outcome.conversation_id.to_string(),
    }))
}

// ── Retrieval index ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IndexRequest {
    file_paths: Vec<String>,
}

async fn rag_index_handler(
    State(state): State<SharedState>,
    Json(payload): Json<IndexRequest>,
) -> Result<Response, ApiError> {
    require_rag(&state)?;
    let report = state.service.index_documents(&payload.file_paths).await?;
    Ok(Json(report).into_response())
}

#[derive(Deserialize)]
struct IndexTextRequest {
    text: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

async fn rag_index_text_handler(
    State(state): State<SharedState>,
    Json(payload): Json<IndexTextRequest>,
) -> Result<Response, ApiError> {
    require_rag(&state)?;
    let report = state
        .service
        .index_text(&payload.text, payload.metadata)
        .await?;
    Ok(Json(report).into_response())
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    #[serde(flatten)]
    answer: RetrievalAnswer,
    source_count: usize,
}

async fn rag_query_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    require_rag(&state)?;
    let answer = state
        .service
        .query_index(&payload.question, payload.context.as_deref())
        .await?;
    Ok(Json(QueryResponse {
        source_count: answer.sources.len(),
        answer,
    }))
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    file: String,
    path: String,
    indexed: usize,
}

async fn rag_upload_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    require_rag(&state)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Upload has no file name"))?;

        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

        let path = save_upload(&state.upload_dir, &file_name, &content).await?;
        let path = path.to_string_lossy().to_string();
        info!(file = %file_name, bytes = content.len(), "Upload saved");

        let report = state.service.index_documents(&[path.clone()]).await?;
        return Ok(Json(UploadResponse {
            success: true,
            file: file_name,
            path,
            indexed: report.indexed_count,
        }));
    }

    Err(ApiError::new(
        StatusCode::BAD_REQUEST,
        "Missing 'file' field",
    ))
}

async fn save_upload(dir: &Path, file_name: &str, content: &[u8]) -> Result<PathBuf, ApiError> {
    let internal = |e: std::io::Error| {
        error!(error = %e, "Failed to save upload");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    };

    tokio::fs::create_dir_all(dir).await.map_err(internal)?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, content).await.map_err(internal)?;
    Ok(path)
}

async fn rag_clear_handler(State(state): State<SharedState>) -> Result<Response, ApiError> {
    require_rag(&state)?;
    let report = state.service.clear_index().await?;
    Ok(Json(report).into_response())
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    #[serde(flatten)]
    stats: IndexStats,
}

async fn rag_stats_handler(State(state): State<SharedState>) -> ApiResult<StatsResponse> {
    require_rag(&state)?;
    let stats = state.service.index_stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
