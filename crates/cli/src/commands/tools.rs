//! `deskmind tools`: List the tools the agent can call.

use deskmind_config::AppConfig;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;
    let tools = service.list_tools().await?;

    println!("Available tools ({}):", tools.len());
    for tool in tools {
        match tool.description {
            Some(description) => println!("  {:<16} {description}", tool.name),
            None => println!("  {}", tool.name),
        }
    }
    Ok(())
}
