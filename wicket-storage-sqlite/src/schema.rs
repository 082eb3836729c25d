//! Table definitions
//!
//! Every statement is idempotent, so [`create_tables`] can run on every start.
use sqlx::SqlitePool;
use wicket_core::{Error, error::StorageError};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS wicket_tokens (
        key TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        payload TEXT NOT NULL,
        consumed INTEGER NOT NULL DEFAULT 0,
        evict_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_wicket_tokens_evict_at ON wicket_tokens(evict_at)",
    r#"
    CREATE TABLE IF NOT EXISTS wicket_users (
        id TEXT PRIMARY KEY,
        primary_email TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_wicket_users_email ON wicket_users(primary_email)",
    r#"
    CREATE TABLE IF NOT EXISTS wicket_identities (
        provider TEXT NOT NULL,
        subject TEXT NOT NULL,
        user_id TEXT NOT NULL REFERENCES wicket_users(id) ON DELETE CASCADE,
        linked_at INTEGER NOT NULL,
        PRIMARY KEY (provider, subject)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_wicket_identities_user ON wicket_identities(user_id)",
];

pub async fn create_tables(pool: &SqlitePool) -> Result<(), Error> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;

    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::Storage(StorageError::Migration(e.to_string())))?;

    tracing::info!("SQLite tables are up to date");
    Ok(())
}
