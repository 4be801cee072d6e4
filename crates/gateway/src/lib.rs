//! HTTP gateway for Parley.
//!
//! Serves the embedded chat page, a health check, and the JSON chat API.
//! Built on Axum; the chatbot is constructed once and shared via `Arc`.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use parley_agent::ChatBot;
use parley_config::AppConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub use api::SharedChatBot;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full router: page, health, and `/api`.
pub fn build_router(chatbot: SharedChatBot) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(chatbot))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the chatbot from `config` and serve until Ctrl+C / SIGTERM.
///
/// Fails before binding when no API key is configured.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let chatbot = Arc::new(ChatBot::from_config(&config)?);
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    serve(chatbot, &addr).await
}

/// Serve `chatbot` on `addr`.
pub async fn serve(chatbot: SharedChatBot, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(chatbot);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
