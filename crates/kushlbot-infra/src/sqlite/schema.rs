//! Idempotent schema bootstrap.
//!
//! There are no migrations: every statement is `IF NOT EXISTS` and runs on
//! each startup. Ownership between the two tables is enforced by queries,
//! not by a foreign key.

use sqlx::SqliteConnection;

const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS chat_sessions (
        id          TEXT PRIMARY KEY NOT NULL,
        session_id  TEXT NOT NULL,
        title       TEXT NOT NULL DEFAULT 'New Chat',
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS chat_messages (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id     TEXT NOT NULL,
        session_id  TEXT NOT NULL,
        role        TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_chat_sessions_owner ON chat_sessions (session_id, updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_chat ON chat_messages (chat_id, created_at)",
];

/// Create both tables and their indexes if they are absent.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}
