//! Configuration loading, validation, and management for deskmind.
//!
//! Loads configuration from `~/.deskmind/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deskmind/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model endpoint
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Agent loop behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Retrieval index
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Built-in tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Conversation sessions
    #[serde(default)]
    pub sessions: SessionsConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

// ── Provider ─────────────────────────────────────────────────────────────

/// Which wire protocol the model endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Ollama native API (`/api/chat`)
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    /// Any OpenAI-compatible server (`/chat/completions`)
    #[serde(rename = "openai_compat")]
    OpenAiCompat,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compat" | "openai-compat" | "openai" => Ok(Self::OpenAiCompat),
            other => Err(ConfigError::ValidationError(format!(
                "unknown provider kind '{other}' (expected 'ollama' or 'openai_compat')"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.2:1b".into()
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

// ── Agent ────────────────────────────────────────────────────────────────

/// What the agent loop does when a tool call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailurePolicy {
    /// Record the failure as the tool's result and let the model continue
    #[default]
    Recover,
    /// Fail the whole turn
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    #[serde(default)]
    pub tool_failure_policy: ToolFailurePolicy,

    /// Sampling temperature; the endpoint default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant with access to filesystem and web fetch capabilities. \
     Use tools when needed to help the user accomplish their tasks."
        .into()
}
fn default_max_tool_rounds() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_tool_rounds: default_max_tool_rounds(),
            tool_failure_policy: ToolFailurePolicy::default(),
            temperature: None,
        }
    }
}

// ── Retrieval ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model used to phrase grounded answers
    #[serde(default = "default_model")]
    pub llm_model: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_top_k() -> usize {
    5
}
fn default_chunk_size() -> usize {
    512
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./rag_store")
}
fn default_collection_name() -> String {
    "electron_docs".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            embedding_model: default_embedding_model(),
            llm_model: default_model(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            store_path: default_store_path(),
            collection_name: default_collection_name(),
        }
    }
}

// ── Tools ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// When non-empty, file tools may only touch paths under these roots
    #[serde(default)]
    pub allowed_roots: Vec<String>,

    #[serde(default = "default_forbidden_paths")]
    pub forbidden_paths: Vec<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_forbidden_paths() -> Vec<String> {
    vec![
        "/etc".into(),
        "/proc".into(),
        "/sys".into(),
        "~/.ssh".into(),
        "~/.gnupg".into(),
        "~/.aws".into(),
    ]
}
fn default_fetch_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_roots: vec![],
            forbidden_paths: default_forbidden_paths(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Where `/rag/upload` stores received files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            upload_dir: default_upload_dir(),
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.deskmind/config.toml).
    ///
    /// Environment overrides:
    /// - `DESKMIND_MODEL`: default model (agent and retrieval answers)
    /// - `DESKMIND_PROVIDER`: provider kind
    /// - `OLLAMA_HOST`: provider base URL
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from a specific path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("DESKMIND_MODEL").filter(|m| !m.is_empty()) {
            self.provider.default_model = model.clone();
            self.retrieval.llm_model = model;
        }

        if let Some(kind) = lookup("DESKMIND_PROVIDER") {
            self.provider.kind = kind.parse()?;
        }

        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.is_empty()) {
            self.provider.base_url = if host.starts_with("http://") || host.starts_with("https://")
            {
                host
            } else {
                format!("http://{host}")
            };
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskmind")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.agent.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.chunk_size must be > 0".into(),
            ));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::ValidationError(
                "retrieval.chunk_overlap must be smaller than retrieval.chunk_size".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_secs must be > 0".into(),
            ));
        }

        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.max_sessions must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.default_model, "llama3.2:1b");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.collection_name, "electron_docs");
        assert_eq!(config.agent.tool_failure_policy, ToolFailurePolicy::Recover);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.base_url, config.provider.base_url);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.retrieval.chunk_size, config.retrieval.chunk_size);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[provider]
kind = "openai_compat"
base_url = "http://localhost:1234/v1"

[agent]
tool_failure_policy = "abort"
max_tool_rounds = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::OpenAiCompat);
        assert_eq!(config.provider.default_model, "llama3.2:1b");
        assert_eq!(config.agent.tool_failure_policy, ToolFailurePolicy::Abort);
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.sessions.max_sessions, 1000);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = Some(5.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tool_rounds_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 9100\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("DESKMIND_MODEL", "qwen2.5:3b"),
            ("DESKMIND_PROVIDER", "openai_compat"),
            ("OLLAMA_HOST", "10.0.0.5:11434"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.provider.default_model, "qwen2.5:3b");
        assert_eq!(config.retrieval.llm_model, "qwen2.5:3b");
        assert_eq!(config.provider.kind, ProviderKind::OpenAiCompat);
        assert_eq!(config.provider.base_url, "http://10.0.0.5:11434");
    }

    #[test]
    fn unknown_provider_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|k| (k == "DESKMIND_PROVIDER").then(|| "gpt".into()));
        assert!(result.is_err());
    }

    #[test]
    fn api_key_is_redacted() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".into());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama3.2:1b"));
        assert!(toml_str.contains("8000"));
    }
}
