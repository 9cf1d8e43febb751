pub mod chat;
pub mod index;
pub mod serve;
pub mod tools;

use anyhow::Context;
use deskmind_agent::AgentService;
use deskmind_config::AppConfig;
use std::path::Path;

/// Load the config file (explicit path or the default location) with
/// environment overrides applied.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.context("Failed to load config")
}

pub async fn build_service(config: &AppConfig) -> anyhow::Result<AgentService> {
    AgentService::from_config(config)
        .await
        .context("Failed to start the agent")
}
