//! Local chat handler

use std::io::Write;
use std::path::Path;

use futures::StreamExt;

use crate::cli::output::print_context;
use crate::cli::output::print_info;
use crate::cli::output::print_warning;
use crate::errors::CopilotError;
use crate::models::ChatRequest;
use crate::models::Conversation;
use crate::rag::CopilotService;
use crate::AppConfig;
use crate::Result;

/// Read a conversation from a JSON array of turns or exchanges
pub fn load_history(path: &Path) -> Result<Conversation> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        CopilotError::InvalidRequest(format!("invalid history file {}: {e}", path.display()))
    })
}

pub async fn handle_chat(
    config: &AppConfig,
    question: String,
    history: Option<&Path>,
    stream: bool,
    show_context: bool,
) -> Result<()> {
    let history = match history {
        Some(path) => load_history(path)?,
        None => Conversation::new(),
    };
    if !history.is_empty() {
        print_info(&format!("Continuing a conversation of {} turns", history.len()));
    }

    let copilot = CopilotService::new(config)?;
    let request = ChatRequest::new(question).with_history(history);

    println!("\n{}", "═".repeat(80));
    if stream {
        let response = copilot.get_chat_response_stream(&request).await?;
        if response.context.is_empty() {
            print_warning("No passages matched the question");
        }
        if show_context {
            print_context(&response.context);
            println!("{}", "─".repeat(80));
        }

        let mut stdout = std::io::stdout();
        let mut reply = response.reply;
        while let Some(fragment) = reply.next().await {
            write!(stdout, "{}", fragment?)?;
            stdout.flush()?;
        }
        println!();
    } else {
        let response = copilot.get_chat_response(&request).await?;
        if response.context.is_empty() {
            print_warning("No passages matched the question");
        }
        if show_context {
            print_context(&response.context);
            println!("{}", "─".repeat(80));
        }
        println!("{}", response.reply.trim());
    }
    println!("{}", "═".repeat(80));

    Ok(())
}
