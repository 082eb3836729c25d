//! Repository implementations for SQLite storage

pub mod token;
pub mod user;

pub use token::SqliteTokenStore;
pub use user::SqliteUserDirectory;

use wicket_core::{Error, error::StorageError};

pub(crate) fn db_error(e: sqlx::Error) -> Error {
    Error::Storage(StorageError::Database(e.to_string()))
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create pool");

    crate::schema::create_tables(&pool)
        .await
        .expect("Failed to create tables");

    pool
}

/// A database file shared by several pooled connections, for tests where
/// callers race each other. Keep the directory alive for the pool's lifetime.
#[cfg(test)]
pub(crate) async fn setup_shared_test_db() -> (tempfile::TempDir, sqlx::SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(dir.path().join("wicket.db"))
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("Failed to create pool");

    crate::schema::create_tables(&pool)
        .await
        .expect("Failed to create tables");

    (dir, pool)
}
