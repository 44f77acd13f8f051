//! SQLite message store implementation.
//!
//! Implements `MessageStore` from `personachat-core`. Turns live in a single
//! `chat_messages` table keyed by the session's opaque messages path; the
//! store never decomposes that path.

use chrono::{DateTime, Utc};
use sqlx::Row;

use personachat_core::chat::store::{ensure_storable, next_turn_timestamp, MessageStore};
use personachat_types::chat::{ChatMessage, MessageRole, SessionKey};
use personachat_types::error::RepositoryError;

use super::map_sqlx_error;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageStore`.
#[derive(Clone)]
pub struct SqliteMessageStore {
    pool: DatabasePool,
}

impl SqliteMessageStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatMessageRow {
    role: String,
    content: String,
    timestamp_us: i64,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp_us: row.try_get("timestamp_us")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            role,
            content: self.content,
            timestamp: from_micros(self.timestamp_us)?,
        })
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| RepositoryError::Query(format!("timestamp out of range: {micros}")))
}

fn collect_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// MessageStore implementation
// ---------------------------------------------------------------------------

impl MessageStore for SqliteMessageStore {
    async fn append(
        &self,
        key: &SessionKey,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        ensure_storable(role)?;
        let path = key.messages_path();

        // Read-then-insert inside one transaction on the single writer connection.
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        let previous: Option<i64> =
            sqlx::query_scalar("SELECT MAX(timestamp_us) FROM chat_messages WHERE path = ?")
                .bind(&path)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        let previous = previous.map(from_micros).transpose()?;
        let timestamp = next_turn_timestamp(previous, Utc::now());

        sqlx::query(
            "INSERT INTO chat_messages (path, role, content, timestamp_us) VALUES (?, ?, ?, ?)",
        )
        .bind(&path)
        .bind(role.to_string())
        .bind(content)
        .bind(timestamp.timestamp_micros())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ChatMessage {
            role,
            content: content.to_string(),
            timestamp,
        })
    }

    async fn read_recent(
        &self,
        key: &SessionKey,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT role, content, timestamp_us FROM (
                   SELECT role, content, timestamp_us FROM chat_messages
                   WHERE path = ? ORDER BY timestamp_us DESC LIMIT ?
               ) ORDER BY timestamp_us ASC"#,
        )
        .bind(key.messages_path())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        collect_messages(&rows)
    }

    async fn read_all(&self, key: &SessionKey) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, timestamp_us FROM chat_messages WHERE path = ? ORDER BY timestamp_us ASC",
        )
        .bind(key.messages_path())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        collect_messages(&rows)
    }

    async fn delete_all(&self, key: &SessionKey) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE path = ?")
            .bind(key.messages_path())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        tracing::debug!(
            path = %key.messages_path(),
            deleted = result.rows_affected(),
            "deleted session turns"
        );
        Ok(())
    }
}
