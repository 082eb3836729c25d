//! SQLite backend for wicket
//!
//! [`SqliteBackend`] bundles a [`TokenStore`](wicket_core::TokenStore) and a
//! [`UserDirectory`](wicket_core::UserDirectory) that share one connection
//! pool.
//!
//! ```rust,no_run
//! use wicket_storage_sqlite::SqliteBackend;
//!
//! # async fn run() -> Result<(), wicket_core::Error> {
//! let backend = SqliteBackend::connect("sqlite://wicket.db?mode=rwc").await?;
//! backend.migrate().await?;
//!
//! let store = backend.token_store();
//! let directory = backend.user_directory();
//! # Ok(())
//! # }
//! ```
pub mod repositories;
mod schema;

pub use repositories::{SqliteTokenStore, SqliteUserDirectory};

use std::sync::Arc;

use sqlx::SqlitePool;
use wicket_core::{Error, error::StorageError};

pub struct SqliteBackend {
    pool: SqlitePool,
    tokens: Arc<SqliteTokenStore>,
    users: Arc<SqliteUserDirectory>,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        let tokens = Arc::new(SqliteTokenStore::new(pool.clone()));
        let users = Arc::new(SqliteUserDirectory::new(pool.clone()));

        Self {
            pool,
            tokens,
            users,
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(Self::new(pool))
    }

    /// Create the wicket tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), Error> {
        schema::create_tables(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn token_store(&self) -> Arc<SqliteTokenStore> {
        self.tokens.clone()
    }

    pub fn user_directory(&self) -> Arc<SqliteUserDirectory> {
        self.users.clone()
    }
}
