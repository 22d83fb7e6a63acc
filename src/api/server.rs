//! HTTP server implementation

use axum::Router;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::CopilotService;
use crate::Result;

/// Build the application router with its middleware layers
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = routes::api_routes(state).layer(TraceLayer::new_for_http());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
///
/// # Errors
/// - `ConfigError` when required settings are missing
/// - Bind errors for the listen address
pub async fn serve_api(config: &AppConfig, host: &str, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting copilot API server...");

    let copilot = CopilotService::new(config)?;
    let app = build_app(AppState::new(copilot), enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health    - Health check");
    info!("  POST /score     - Chat (JSON or server-sent events)");
    info!("  POST /api/chat  - Chat (JSON or server-sent events)");

    axum::serve(listener, app).await?;

    Ok(())
}
