//! Chat turn handler.
//!
//! Endpoints:
//! - POST /api/v1/bots/{bot}/chat - Send one message, receive the bot's reply
//!
//! The reply is returned whole; the turn is persisted before the response
//! is sent. The turn runs on its own task so a client that disconnects
//! mid-turn cannot leave it half-recorded.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use personachat_types::chat::{ChatReply, ChatRequest};

use crate::http::error::AppError;
use crate::http::extractors::identity::UserId;
use crate::http::handlers::parse_bot;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
    /// Continue this session. Omitted or blank starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/v1/bots/{bot}/chat - Process one chat turn.
pub async fn send_message(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(bot): Path<String>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let timer = RequestTimer::start();
    let bot = parse_bot(&bot)?;

    if body.message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }

    let request = ChatRequest {
        user_id,
        bot,
        session_id: body.session_id,
        text: body.message,
    };
    let conversation = Arc::clone(&state.conversation);
    let turn = tokio::spawn(async move { conversation.send_message(request).await });

    let reply = turn
        .await
        .map_err(|e| AppError::Internal(format!("chat turn aborted: {e}")))??;

    let messages_link = format!(
        "/api/v1/bots/{}/sessions/{}/messages",
        bot.slug(),
        reply.session_id
    );
    Ok(Json(timer.finish(reply).with_link("messages", &messages_link)))
}
