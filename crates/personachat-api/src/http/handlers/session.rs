//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/bots/{bot}/sessions                - List sessions, oldest first
//! - GET    /api/v1/bots/{bot}/last-session            - Most recently active session
//! - GET    /api/v1/bots/{bot}/sessions/{id}/messages  - Full transcript
//! - DELETE /api/v1/bots/{bot}/sessions/{id}           - Delete a session
//!
//! Unknown sessions are not an error: they read as empty.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use personachat_types::chat::{ChatMessage, SessionSummary};

use crate::http::error::AppError;
use crate::http::extractors::identity::UserId;
use crate::http::handlers::parse_bot;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LastSession {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
    pub session_id: String,
}

/// GET /api/v1/bots/{bot}/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(bot): Path<String>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let timer = RequestTimer::start();
    let bot = parse_bot(&bot)?;

    let sessions = state.conversation.list_sessions(&user_id, bot).await?;

    let self_link = format!("/api/v1/bots/{}/sessions", bot.slug());
    Ok(Json(timer.finish(sessions).with_link("self", &self_link)))
}

/// GET /api/v1/bots/{bot}/last-session
pub async fn last_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(bot): Path<String>,
) -> Result<Json<ApiResponse<LastSession>>, AppError> {
    let timer = RequestTimer::start();
    let bot = parse_bot(&bot)?;

    let session_id = state.conversation.resume(&user_id, bot).await?;

    Ok(Json(timer.finish(LastSession { session_id })))
}

/// GET /api/v1/bots/{bot}/sessions/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path((bot, session_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let timer = RequestTimer::start();
    let bot = parse_bot(&bot)?;

    let messages = state
        .conversation
        .history(&user_id, bot, &session_id)
        .await?;

    Ok(Json(timer.finish(messages)))
}

/// DELETE /api/v1/bots/{bot}/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path((bot, session_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let timer = RequestTimer::start();
    let bot = parse_bot(&bot)?;

    state
        .conversation
        .delete_session(&user_id, bot, &session_id)
        .await?;

    Ok(Json(timer.finish(Deleted {
        deleted: true,
        session_id,
    })))
}
