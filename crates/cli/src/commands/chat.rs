//! `umbra chat`: interactive or single-message chat mode.

use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;
use umbra_agent::DispatchResult;
use umbra_config::AppConfig;

/// Lines that end interactive mode.
fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

fn print_reply(result: &DispatchResult) {
    let prefix = if result.success { "Umbra" } else { "Umbra (!)" };
    for line in result.reply().lines() {
        println!("  {prefix} > {line}");
    }
    println!();
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let orchestrator = umbra_agent::bootstrap::build(&config).await?;
    let mut session = orchestrator.session();
    debug!(session = session.id(), "Chat session started");

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = session.handle(&msg).await;
        eprint!("\r              \r");
        println!("{}", result.reply());
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Umbra: Interactive Mode");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", orchestrator.registry().names().join(", "));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        eprint!("  ...");
        let result = session.handle(line.trim()).await;
        eprint!("\r     \r");
        println!();
        print_reply(&result);
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
