//! HTTP request handlers for the REST API.

pub mod bot;
pub mod chat;
pub mod session;

use personachat_types::persona::Persona;

use crate::http::error::AppError;

/// Parse a bot path parameter (bot id or slug).
pub(crate) fn parse_bot(raw: &str) -> Result<Persona, AppError> {
    raw.parse::<Persona>().map_err(AppError::Validation)
}
