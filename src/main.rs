use anyhow::Context;
use clap::Parser;
use copilot_rag::cli::handle_chat;
use copilot_rag::cli::handle_config_command;
use copilot_rag::cli::handle_invoke;
use copilot_rag::cli::handle_serve_api;
use copilot_rag::cli::Cli;
use copilot_rag::cli::Commands;
use copilot_rag::config::AppConfig;
use copilot_rag::logging::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; environment values win over the file
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };
    config.apply_env_overrides();

    // Initialize logging
    let level_override = cli.verbose.then_some("debug");
    init_logging(&config.logging, level_override)?;
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Chat {
            question,
            history,
            stream,
            show_context,
        } => {
            handle_chat(&config, question, history.as_deref(), stream, show_context).await?;
        }
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Invoke {
            url,
            token,
            query,
            stream,
        } => {
            handle_invoke(&config, url, token, query, stream).await?;
        }
        Commands::Config => {
            handle_config_command(&config).await?;
        }
    }

    Ok(())
}
