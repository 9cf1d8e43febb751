//! `deskmind chat`: Interactive or single-message chat mode.

use deskmind_agent::{AgentService, ChatOutcome};
use deskmind_config::AppConfig;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config: AppConfig,
    message: Option<String>,
    model: Option<String>,
    rag: bool,
) -> anyhow::Result<()> {
    let service = super::build_service(&config).await?;

    if let Some(msg) = message {
        // Single message mode
        let outcome = service.chat(&msg, model.as_deref(), rag, None).await?;
        println!("{}", outcome.response_text);
        print_sources(&outcome);
        return Ok(());
    }

    println!();
    println!("  deskmind — interactive chat");
    println!();
    println!("  Model:     {}", model.as_deref().unwrap_or(service.default_model()));
    println!("  Retrieval: {}", if rag && service.retrieval_enabled() { "on" } else { "off" });
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    repl(&service, model.as_deref(), rag).await?;

    println!();
    println!("  Goodbye!");
    Ok(())
}

async fn repl(service: &AgentService, model: Option<&str>, rag: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation_id: Option<String> = None;

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match service
            .chat(line, model, rag, conversation_id.as_deref())
            .await
        {
            Ok(outcome) => {
                conversation_id = Some(outcome.conversation_id.to_string());
                println!();
                for text in outcome.response_text.lines() {
                    println!("  Assistant > {text}");
                }
                print_sources(&outcome);
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }
    Ok(())
}

fn print_sources(outcome: &ChatOutcome) {
    let Some(sources) = &outcome.sources else {
        return;
    };
    if sources.is_empty() {
        return;
    }

    println!();
    println!("  Sources:");
    for (i, source) in sources.iter().enumerate() {
        let file = source
            .metadata
            .get("file_name")
            .and_then(|v| v.as_str())
            .unwrap_or("text");
        match source.score {
            Some(score) => println!("    {}. [{score:.2}] {file}", i + 1),
            None => println!("    {}. {file}", i + 1),
        }
    }
}
