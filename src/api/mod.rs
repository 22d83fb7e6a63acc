//! API server module for serving the copilot over REST and server-sent events

pub mod client;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use client::EndpointClient;
pub use server::serve_api;
