//! MessageStore trait definition.
//!
//! Append-only, ordered persistence of turns within one session. Follows the
//! same RPITIT pattern as the other storage ports.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use personachat_types::chat::{ChatMessage, MessageRole, SessionKey};
use personachat_types::error::RepositoryError;

/// Repository trait for session turns.
///
/// Implementations treat the [`SessionKey`] as an opaque hierarchical path
/// (see [`SessionKey::messages_path`]) and never look inside it.
/// Implementations live in personachat-infra (e.g., `SqliteMessageStore`).
pub trait MessageStore: Send + Sync {
    /// Write one immutable turn with a store-assigned timestamp strictly
    /// greater than every earlier timestamp of the same session.
    ///
    /// System turns are synthesized per request and must be rejected.
    fn append(
        &self,
        key: &SessionKey,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// The newest `limit` turns, ordered oldest-first. Empty for an unknown session.
    fn read_recent(
        &self,
        key: &SessionKey,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Every turn of the session, ordered oldest-first.
    fn read_all(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Remove every turn of the session. Deleting an empty session succeeds.
    fn delete_all(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Timestamp for the next turn of a session: `now` at microsecond precision,
/// bumped to one microsecond past `previous` when the clock has not moved on.
pub fn next_turn_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match previous {
        Some(prev) if prev >= now => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// Reject roles that must never be persisted.
pub fn ensure_storable(role: MessageRole) -> Result<(), RepositoryError> {
    match role {
        MessageRole::System => Err(RepositoryError::Invalid(
            "system turns are synthesized per request and never stored".to_string(),
        )),
        MessageRole::User | MessageRole::Assistant => Ok(()),
    }
}
