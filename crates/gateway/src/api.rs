//! JSON API for the chat page.
//!
//! `POST /api/chat` always answers 200 with text: model and store failures
//! come back as the chatbot's fallback message, never as an HTTP error.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use parley_agent::ChatBot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared handler state: the one chatbot built at startup.
pub type SharedChatBot = Arc<ChatBot>;

/// Build the `/api` routes (nest under `/api`).
pub fn api_router(chatbot: SharedChatBot) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route(
            "/threads/{id}",
            get(get_thread_handler).delete(delete_thread_handler),
        )
        .with_state(chatbot)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub thread_id: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
struct MessageDto {
    id: String,
    role: String,
    content: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ThreadResponse {
    thread_id: String,
    messages: Vec<MessageDto>,
    created_at: String,
    updated_at: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(chatbot): State<SharedChatBot>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!(
        message_len = payload.message.len(),
        has_thread = payload.thread_id.is_some(),
        "Chat request"
    );

    let reply = chatbot
        .reply(
            &payload.message,
            payload.language.as_deref(),
            payload.thread_id.as_deref(),
        )
        .await;

    Json(ChatResponse {
        thread_id: reply.thread_id.to_string(),
        response: reply.content,
    })
}

async fn get_thread_handler(
    State(chatbot): State<SharedChatBot>,
    Path(id): Path<String>,
) -> Result<Json<ThreadResponse>, StatusCode> {
    let thread = chatbot
        .history(&id)
        .await
        .map_err(|e| {
            error!(thread_id = %id, error = %e, "Failed to load thread");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ThreadResponse {
        thread_id: thread.id.to_string(),
        messages: thread
            .messages
            .iter()
            .map(|m| MessageDto {
                id: m.id.clone(),
                role: m.role.to_string(),
                content: m.content.clone(),
                timestamp: m.timestamp.to_rfc3339(),
            })
            .collect(),
        created_at: thread.created_at.to_rfc3339(),
        updated_at: thread.updated_at.to_rfc3339(),
    }))
}

async fn delete_thread_handler(
    State(chatbot): State<SharedChatBot>,
    Path(id): Path<String>,
) -> StatusCode {
    match chatbot.clear_thread(&id).await {
        Ok(true) => {
            info!(thread_id = %id, "Thread cleared");
            StatusCode::NO_CONTENT
        }
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(thread_id = %id, error = %e, "Failed to clear thread");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
