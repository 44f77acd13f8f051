//! SessionRegistry trait definition.
//!
//! Tracks which sessions exist for a `(user, bot)` pair, when they were
//! created, and which one was touched last.

use chrono::{DateTime, Utc};

use personachat_types::chat::SessionSummary;
use personachat_types::error::RepositoryError;
use personachat_types::persona::Persona;

use super::session_id::SessionIdGenerator;

/// Repository trait for session metadata and the active-session pointer.
///
/// Implementations live in personachat-infra (e.g., `SqliteSessionRegistry`).
pub trait SessionRegistry: Send + Sync {
    /// Generator backing [`SessionRegistry::resolve_or_create`].
    fn session_ids(&self) -> &SessionIdGenerator;

    /// Return the supplied id unchanged, or synthesize `{bot}_{timestamp}`.
    ///
    /// Performs no I/O and no existence check: a session exists from the
    /// moment its first turn is appended. Blank ids count as absent.
    fn resolve_or_create(&self, _user_id: &str, bot: Persona, session_id: Option<&str>) -> String {
        match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => self.session_ids().next(bot),
        }
    }

    /// Point the `(user, bot)` active-session pointer at `session_id`. Last write wins.
    fn touch_last_active(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recently touched session of `(user, bot)`, if any.
    fn get_last_active(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Sessions with a metadata record, ascending by `created_at`.
    fn list_sessions(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Record `created_at` unless the session already has one.
    fn upsert_metadata(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
        created_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Drop the listing entry. Removing a missing entry succeeds.
    fn delete_metadata(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
