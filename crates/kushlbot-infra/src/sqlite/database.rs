//! Database handle that opens one SQLite connection per request.
//!
//! There is no pool: `Database` only holds connect options.
//! Each request calls [`Database::connect`], owns the connection for its
//! duration, and drops it on return (success or error), which closes it.

use std::path::Path;
use std::time::Duration;

use kushlbot_types::error::RepositoryError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, SqliteConnection};

use super::schema::ensure_schema;

/// Connect options for the chat database file.
#[derive(Clone, Debug)]
pub struct Database {
    options: SqliteConnectOptions,
}

impl Database {
    /// Open (creating if missing) the database at `path` and bootstrap the schema.
    ///
    /// Uses WAL journal mode and a 5-second busy timeout so concurrent
    /// request connections wait for each other instead of failing.
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let mut conn = options.connect().await?;
        ensure_schema(&mut conn).await?;
        conn.close().await?;

        tracing::debug!(path = %path.display(), "Database schema ready");

        Ok(Self { options })
    }

    /// Open a fresh connection for one request.
    pub async fn connect(&self) -> Result<SqliteConnection, RepositoryError> {
        self.options
            .connect()
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))
    }
}
