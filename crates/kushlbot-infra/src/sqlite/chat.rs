//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `kushlbot-core` over a single
//! request-scoped `SqliteConnection`: raw queries, private Row structs,
//! every statement filtered by the owning session id.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use kushlbot_core::chat::repository::{ChatRepository, ClearedRows};
use kushlbot_types::chat::{
    ChatMessage, ChatSession, ChatSummary, DEFAULT_CHAT_TITLE, MessageRole, NewChatMessage,
};
use kushlbot_types::error::RepositoryError;
use kushlbot_types::identity::SessionId;
use sqlx::{Connection, Row, SqliteConnection};
use uuid::Uuid;

/// SQLite-backed implementation of `ChatRepository`.
///
/// Owns its connection; dropping the repository closes it.
pub struct SqliteChatRepository {
    conn: SqliteConnection,
}

impl SqliteChatRepository {
    pub fn new(conn: SqliteConnection) -> Self {
        Self { conn }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for the history listing (session + message count).
struct ChatSummaryRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

impl ChatSummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            message_count: row.try_get("message_count")?,
        })
    }

    fn into_summary(self) -> Result<ChatSummary, RepositoryError> {
        Ok(ChatSummary {
            id: parse_uuid(&self.id, "chat id")?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            message_count: self.message_count as u32,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    session_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "chat id")?,
            session_id: parse_session_id(&self.session_id)?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: i64,
    chat_id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id: self.id,
            chat_id: parse_uuid(&self.chat_id, "chat_id")?,
            session_id: parse_session_id(&self.session_id)?,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_session_id(s: &str) -> Result<SessionId, RepositoryError> {
    SessionId::parse(s).ok_or_else(|| RepositoryError::Query(format!("invalid session_id: {s}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 (microseconds, `Z`), so text order is time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drop sub-microsecond precision so returned values equal what is read back.
fn storage_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

const MESSAGE_COLUMNS: &str = "id, chat_id, session_id, role, content, created_at";

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_chat(&mut self, chat: &ChatSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, session_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(chat.id.to_string())
        .bind(chat.session_id.as_str())
        .bind(&chat.title)
        .bind(format_datetime(&chat.created_at))
        .bind(format_datetime(&chat.updated_at))
        .execute(&mut self.conn)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn find_chat(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, session_id, title, created_at, updated_at FROM chat_sessions WHERE id = ? AND session_id = ?",
        )
        .bind(chat_id.to_string())
        .bind(owner.as_str())
        .fetch_optional(&mut self.conn)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_error)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_chats(&mut self, owner: &SessionId) -> Result<Vec<ChatSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.id, s.title, s.created_at, s.updated_at, COUNT(m.id) AS message_count
               FROM chat_sessions s
               LEFT JOIN chat_messages m ON m.chat_id = s.id AND m.session_id = s.session_id
               WHERE s.session_id = ?
               GROUP BY s.id
               ORDER BY s.updated_at DESC, s.created_at DESC"#,
        )
        .bind(owner.as_str())
        .fetch_all(&mut self.conn)
        .await
        .map_err(query_error)?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary_row = ChatSummaryRow::from_row(row).map_err(query_error)?;
            chats.push(summary_row.into_summary()?);
        }

        Ok(chats)
    }

    async fn set_title_if_default(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        // Only the first writer still sees the default title.
        let result = sqlx::query(
            "UPDATE chat_sessions SET title = ?, updated_at = ? \
             WHERE id = ? AND session_id = ? AND title = ?",
        )
        .bind(title)
        .bind(format_datetime(&updated_at))
        .bind(chat_id.to_string())
        .bind(owner.as_str())
        .bind(DEFAULT_CHAT_TITLE)
        .execute(&mut self.conn)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_chat(&mut self, chat_id: &Uuid, owner: &SessionId) -> Result<(), RepositoryError> {
        let mut tx = self.conn.begin().await.map_err(query_error)?;

        // Children before parent.
        sqlx::query("DELETE FROM chat_messages WHERE chat_id = ? AND session_id = ?")
            .bind(chat_id.to_string())
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND session_id = ?")
            .bind(chat_id.to_string())
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            // Dropping `tx` rolls back.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn clear_all(&mut self, owner: &SessionId) -> Result<ClearedRows, RepositoryError> {
        let mut tx = self.conn.begin().await.map_err(query_error)?;

        let messages = sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();

        let chats = sqlx::query("DELETE FROM chat_sessions WHERE session_id = ?")
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();

        tx.commit().await.map_err(query_error)?;
        Ok(ClearedRows { chats, messages })
    }

    async fn save_message(&mut self, message: &NewChatMessage) -> Result<ChatMessage, RepositoryError> {
        let created_at = storage_precision(message.created_at);

        let result = sqlx::query(
            r#"INSERT INTO chat_messages (chat_id, session_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.chat_id.to_string())
        .bind(message.session_id.as_str())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&created_at))
        .execute(&mut self.conn)
        .await
        .map_err(query_error)?;

        let stored = NewChatMessage {
            created_at,
            ..message.clone()
        };
        Ok(stored.into_message(result.last_insert_rowid()))
    }

    async fn get_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE chat_id = ? AND session_id = ? ORDER BY created_at ASC, id ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(chat_id.to_string())
            .bind(owner.as_str())
            .fetch_all(&mut self.conn)
            .await
            .map_err(query_error)?;

        rows_into_messages(&rows)
    }

    async fn recent_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let sql = format!(
            r#"SELECT {MESSAGE_COLUMNS} FROM (
                   SELECT {MESSAGE_COLUMNS} FROM chat_messages
                   WHERE chat_id = ? AND session_id = ?
                   ORDER BY created_at DESC, id DESC
                   LIMIT ?
               )
               ORDER BY created_at ASC, id ASC"#
        );

        let rows = sqlx::query(&sql)
            .bind(chat_id.to_string())
            .bind(owner.as_str())
            .bind(i64::from(limit))
            .fetch_all(&mut self.conn)
            .await
            .map_err(query_error)?;

        rows_into_messages(&rows)
    }

    async fn count_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        role: MessageRole,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM chat_messages WHERE chat_id = ? AND session_id = ? AND role = ?",
        )
        .bind(chat_id.to_string())
        .bind(owner.as_str())
        .bind(role.to_string())
        .fetch_one(&mut self.conn)
        .await
        .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u32)
    }
}

fn rows_into_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row = ChatMessageRow::from_row(row).map_err(query_error)?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}
