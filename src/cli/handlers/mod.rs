//! CLI command handlers module
//!
//! This module is organized by command:
//! - chat: Run the copilot pipeline locally
//! - serve: API server
//! - invoke: Call a deployed endpoint
//! - info: Configuration display

pub mod chat;
pub mod info;
pub mod invoke;
pub mod serve;

// Re-export all public handlers
pub use chat::*;
pub use info::*;
pub use invoke::*;
pub use serve::*;
