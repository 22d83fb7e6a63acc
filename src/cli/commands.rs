//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

/// Default question sent by `copilot invoke`
pub const DEFAULT_INVOKE_QUERY: &str = "What can you tell me about the trailwalker shoes?";

#[derive(Parser)]
#[command(name = "copilot")]
#[command(about = "Retrieval-augmented product copilot")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the copilot a question
    Chat {
        /// The question to ask
        question: String,
        /// JSON file holding the prior conversation
        #[arg(long)]
        history: Option<PathBuf>,
        /// Print the reply as it is generated
        #[arg(short, long)]
        stream: bool,
        /// Show the retrieved passages
        #[arg(long)]
        show_context: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Host to bind (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
    /// Call a deployed copilot endpoint
    Invoke {
        /// Scoring URL of the endpoint
        #[arg(long)]
        url: String,
        /// Bearer token for the endpoint
        #[arg(long)]
        token: Option<String>,
        /// Question to send
        #[arg(short, long, default_value = DEFAULT_INVOKE_QUERY)]
        query: String,
        /// Request a server-sent event stream
        #[arg(short, long)]
        stream: bool,
    },
    /// Show the effective configuration with secrets masked
    Config,
}
