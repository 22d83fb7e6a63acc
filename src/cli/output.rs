//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `copilot` CLI

use crate::models::RetrievalResult;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// This prevents panics when truncating strings with multi-byte UTF-8 characters (emojis, etc.)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print retrieved passages in full
pub fn print_context(context: &RetrievalResult) {
    println!("📚 Context ({} passages):", context.len());
    for (idx, passage) in context.iter().enumerate() {
        println!("  {}. [{}]", idx + 1, passage.id);
        for line in passage.content.lines() {
            println!("     {line}");
        }
    }
}

/// Print configuration; pass a redacted copy
pub fn print_config(config: &AppConfig) {
    println!("📋 Copilot Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory);
    println!("  File output: {}", config.logging.file_output);
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {:?}", config.llm.provider);
    println!("  Endpoint: {}", config.llm.endpoint);
    println!("  API key: {}", config.llm.api_key);
    println!("  API version: {}", config.llm.api_version);
    println!("  Chat deployment: {}", config.llm.chat_deployment);
    println!("  Embedding deployment: {}", config.llm.embedding_deployment);
    println!();

    println!("🔍 Search:");
    println!("  Endpoint: {}", config.search.endpoint);
    println!("  API key: {}", config.search.api_key);
    println!("  Index: {}", config.search.index_name);
    println!("  API version: {}", config.search.api_version);
    println!("  Vector field: {}", config.search.vector_field);
    println!();

    println!("💬 Copilot:");
    println!("  Retrieval limit: {}", config.copilot.retrieval_limit);
    println!("  Intent max tokens: {}", config.copilot.intent_max_tokens);
    println!("  Reply max tokens: {}", config.copilot.reply_max_tokens);
    println!("  Temperature: {}", config.copilot.temperature);
    println!("  Request timeout: {}s", config.copilot.request_timeout_secs);
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}
