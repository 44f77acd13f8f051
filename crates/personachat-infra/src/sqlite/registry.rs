//! SQLite session registry implementation.
//!
//! Implements `SessionRegistry` from `personachat-core` on two tables:
//! `session_metadata` (listing entries, write-once `created_at`) and
//! `active_sessions` (one pointer per user/bot scope).

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use personachat_core::chat::registry::SessionRegistry;
use personachat_core::chat::session_id::SessionIdGenerator;
use personachat_types::chat::{SessionKey, SessionSummary};
use personachat_types::error::RepositoryError;
use personachat_types::persona::Persona;

use super::map_sqlx_error;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRegistry`.
pub struct SqliteSessionRegistry {
    pool: DatabasePool,
    ids: SessionIdGenerator,
}

impl SqliteSessionRegistry {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            ids: SessionIdGenerator::new(),
        }
    }
}

struct SessionSummaryRow {
    session_id: String,
    created_at: String,
}

impl SessionSummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_summary(self) -> Result<SessionSummary, RepositoryError> {
        Ok(SessionSummary {
            session_id: self.session_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// SessionRegistry implementation
// ---------------------------------------------------------------------------

impl SessionRegistry for SqliteSessionRegistry {
    fn session_ids(&self) -> &SessionIdGenerator {
        &self.ids
    }

    async fn touch_last_active(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO active_sessions (scope, session_id, touched_at) VALUES (?, ?, ?)
               ON CONFLICT(scope) DO UPDATE SET
                   session_id = excluded.session_id,
                   touched_at = excluded.touched_at"#,
        )
        .bind(SessionKey::scope_path(user_id, bot))
        .bind(session_id)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_last_active(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> Result<Option<String>, RepositoryError> {
        sqlx::query_scalar("SELECT session_id FROM active_sessions WHERE scope = ?")
            .bind(SessionKey::scope_path(user_id, bot))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT session_id, created_at FROM session_metadata
               WHERE scope = ? ORDER BY created_at ASC, session_id ASC"#,
        )
        .bind(SessionKey::scope_path(user_id, bot))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary_row =
                SessionSummaryRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(summary_row.into_summary()?);
        }

        Ok(sessions)
    }

    async fn upsert_metadata(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO session_metadata (scope, session_id, created_at) VALUES (?, ?, ?)
               ON CONFLICT(scope, session_id) DO NOTHING"#,
        )
        .bind(SessionKey::scope_path(user_id, bot))
        .bind(session_id)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_metadata(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM session_metadata WHERE scope = ? AND session_id = ?")
            .bind(SessionKey::scope_path(user_id, bot))
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
