use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use wicket_core::{
    ConsumeOutcome, Error, StoredToken, TokenStore, error::StorageError, validation,
};

use super::db_error;

const LOGIN_TICKET_KIND: &str = "login_ticket";

/// [`TokenStore`] over the `wicket_tokens` table.
///
/// Records are stored as JSON. The consumed flag of login tickets lives in its
/// own column so it can be flipped with a single conditional `UPDATE`.
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteToken {
    payload: String,
    consumed: bool,
}

impl SqliteToken {
    fn into_record(self) -> Result<StoredToken, Error> {
        let mut record: StoredToken = serde_json::from_str(&self.payload)
            .map_err(|e| Error::Storage(StorageError::Serialization(e)))?;
        if let StoredToken::LoginTicket(ticket) = &mut record {
            ticket.consumed = self.consumed;
        }
        Ok(record)
    }
}

fn kind_of(record: &StoredToken) -> &'static str {
    match record {
        StoredToken::Session(_) => "session",
        StoredToken::LoginTicket(_) => LOGIN_TICKET_KIND,
        StoredToken::PendingAuthorization(_) => "pending_authorization",
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn put(&self, key: &str, record: StoredToken, ttl: Duration) -> Result<(), Error> {
        let payload = serde_json::to_string(&record)
            .map_err(|e| Error::Storage(StorageError::Serialization(e)))?;
        let evict_at = validation::deadline(Utc::now(), ttl)?.timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO wicket_tokens (key, kind, payload, consumed, evict_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(key) DO UPDATE SET
                kind = excluded.kind,
                payload = excluded.payload,
                consumed = excluded.consumed,
                evict_at = excluded.evict_at
            "#,
        )
        .bind(key)
        .bind(kind_of(&record))
        .bind(payload)
        .bind(record.is_consumed())
        .bind(evict_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredToken>, Error> {
        let row = sqlx::query_as::<_, SqliteToken>(
            "SELECT payload, consumed FROM wicket_tokens WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(SqliteToken::into_record).transpose()
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM wicket_tokens WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<StoredToken>, Error> {
        let row = sqlx::query_as::<_, SqliteToken>(
            "DELETE FROM wicket_tokens WHERE key = ?1 RETURNING payload, consumed",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(SqliteToken::into_record).transpose()
    }

    async fn consume(&self, key: &str) -> Result<ConsumeOutcome, Error> {
        let flipped = sqlx::query_as::<_, SqliteToken>(
            r#"
            UPDATE wicket_tokens SET consumed = 1
            WHERE key = ?1 AND kind = ?2 AND consumed = 0
            RETURNING payload, consumed
            "#,
        )
        .bind(key)
        .bind(LOGIN_TICKET_KIND)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = flipped {
            return match row.into_record()? {
                StoredToken::LoginTicket(ticket) => Ok(ConsumeOutcome::Consumed(ticket)),
                _ => Ok(ConsumeOutcome::Missing),
            };
        }

        let kind: Option<(String,)> =
            sqlx::query_as("SELECT kind FROM wicket_tokens WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        match kind {
            Some((kind,)) if kind == LOGIN_TICKET_KIND => Ok(ConsumeOutcome::AlreadyConsumed),
            _ => Ok(ConsumeOutcome::Missing),
        }
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query("DELETE FROM wicket_tokens WHERE evict_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
