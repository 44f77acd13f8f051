//! Bot catalogue handler.
//!
//! Endpoints:
//! - GET /api/v1/bots - List the available bots

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use personachat_types::persona::Persona;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Catalogue entry for one bot.
#[derive(Debug, Serialize)]
pub struct BotInfo {
    pub bot_id: &'static str,
    pub slug: &'static str,
    pub instruction: String,
}

/// GET /api/v1/bots - List the available bots with their effective instruction.
pub async fn list_bots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BotInfo>>>, AppError> {
    let timer = RequestTimer::start();

    let bots = Persona::ALL
        .iter()
        .map(|p| BotInfo {
            bot_id: p.bot_id(),
            slug: p.slug(),
            instruction: state.personas.instruction(*p).to_string(),
        })
        .collect();

    Ok(Json(timer.finish(bots).with_link("self", "/api/v1/bots")))
}
