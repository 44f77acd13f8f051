//! Session, turn, and request/reply types.
//!
//! A session is one conversation thread scoped to a `(user, bot)` pair.
//! Turns are append-only and ordered by a store-assigned timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::Message;
use crate::persona::Persona;

pub use crate::llm::MessageRole;

/// Fully qualified address of one session: `(user, bot, session id)`.
///
/// Stores only ever see the hierarchical paths derived from this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub bot: Persona,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, bot: Persona, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            bot,
            session_id: session_id.into(),
        }
    }

    /// Path of the scope that owns every session of `(user, bot)`.
    pub fn scope_path(user_id: &str, bot: Persona) -> String {
        format!(
            "users/{}/bots/{}",
            escape_segment(user_id),
            escape_segment(bot.bot_id())
        )
    }

    /// Path of the ordered message collection of this session.
    pub fn messages_path(&self) -> String {
        format!(
            "{}/sessions/{}/messages",
            Self::scope_path(&self.user_id, self.bot),
            escape_segment(&self.session_id)
        )
    }
}

/// Escape `%` and `/` so that distinct segments always yield distinct paths.
fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

/// One stored turn. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Strictly increasing within a session; doubles as the turn's key.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// The role/content pair submitted to the completion engine.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Listing entry for a session that has completed at least one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

/// One inbound chat turn, identity already validated by the transport.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_id: String,
    pub bot: Persona,
    /// Resume this session; a fresh one is started when absent.
    pub session_id: Option<String>,
    pub text: String,
}

/// Result of a successful chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}
