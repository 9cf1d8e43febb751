//! `deskmind index | query | stats | clear`: Document index management.

use anyhow::bail;
use deskmind_config::AppConfig;

pub async fn index(config: AppConfig, paths: Vec<String>) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;
    let report = service.index_documents(&paths).await?;

    if !report.success {
        bail!(
            "Indexing failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("Indexed {} document(s):", report.indexed_count);
    for file in &report.files {
        println!("  {file}");
    }
    let skipped = paths.len().saturating_sub(report.files.len());
    if skipped > 0 {
        println!("Skipped {skipped} file(s) that could not be read");
    }
    Ok(())
}

pub async fn query(
    config: AppConfig,
    question: String,
    context: Option<String>,
) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;
    let answer = service.query_index(&question, context.as_deref()).await?;

    if !answer.success {
        bail!(
            "Query failed: {}",
            answer.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("{}", answer.response_text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources ({}):", answer.sources.len());
        for source in &answer.sources {
            let score = source.score.map(|s| format!("{s:.2}")).unwrap_or_default();
            println!("  [{score}] {}", source.text.replace('\n', " "));
        }
    }
    Ok(())
}

pub async fn stats(config: AppConfig) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;
    let stats = service.index_stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub async fn clear(config: AppConfig) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;
    let report = service.clear_index().await?;
    if !report.success {
        bail!(
            "Clear failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("{}", report.message.as_deref().unwrap_or("Index cleared"));
    Ok(())
}
