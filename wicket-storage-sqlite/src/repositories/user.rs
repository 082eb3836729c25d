use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use wicket_core::{
    Error, IdentityClaim, LinkedIdentity, ProviderKind, User, UserDirectory, UserId,
    error::StorageError,
};

use super::db_error;

/// [`UserDirectory`] over the `wicket_users` and `wicket_identities` tables.
///
/// The `(provider, subject)` primary key on `wicket_identities` is what makes
/// `resolve_or_create` atomic per pair.
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, row: SqliteUser) -> Result<User, Error> {
        let identities = sqlx::query_as::<_, SqliteIdentity>(
            "SELECT provider, subject FROM wicket_identities WHERE user_id = ?1",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let linked_identities = identities
            .into_iter()
            .map(SqliteIdentity::into_identity)
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(User {
            id: UserId::from(row.id),
            primary_email: row.primary_email,
            linked_identities,
            created_at: from_millis(row.created_at)?,
        })
    }

    async fn owner_of(&self, identity: &LinkedIdentity) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            SELECT u.id, u.primary_email, u.created_at
            FROM wicket_users u
            JOIN wicket_identities i ON i.user_id = u.id
            WHERE i.provider = ?1 AND i.subject = ?2
            "#,
        )
        .bind(identity.provider.as_str())
        .bind(&identity.subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    primary_email: String,
    created_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteIdentity {
    provider: String,
    subject: String,
}

impl SqliteIdentity {
    fn into_identity(self) -> Result<LinkedIdentity, Error> {
        let provider: ProviderKind = self.provider.parse().map_err(|_| {
            Error::Storage(StorageError::Database(format!(
                "Unknown provider in wicket_identities: {}",
                self.provider
            )))
        })?;
        Ok(LinkedIdentity::new(provider, self.subject))
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!("Invalid timestamp: {millis}")))
    })
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn get(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, primary_email, created_at FROM wicket_users WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_identity(
        &self,
        provider: ProviderKind,
        subject_id: &str,
    ) -> Result<Option<User>, Error> {
        self.owner_of(&LinkedIdentity::new(provider, subject_id))
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            SELECT id, primary_email, created_at FROM wicket_users
            WHERE primary_email = ?1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn resolve_or_create(
        &self,
        claim: &IdentityClaim,
        link_by_email: bool,
    ) -> Result<User, Error> {
        let identity = LinkedIdentity::from(claim);

        if let Some(user) = self.owner_of(&identity).await? {
            return Ok(user);
        }

        let existing = if link_by_email {
            self.find_by_email(claim.email()).await?
        } else {
            None
        };

        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Writes come first so the transaction holds the write lock from the
        // start.
        let user_id = match &existing {
            Some(user) => user.id.clone(),
            None => {
                let user = User::from_claim(claim);
                sqlx::query(
                    "INSERT INTO wicket_users (id, primary_email, created_at) VALUES (?1, ?2, ?3)",
                )
                .bind(user.id.as_str())
                .bind(&user.primary_email)
                .bind(user.created_at.timestamp_millis())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
                user.id
            }
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO wicket_identities (provider, subject, user_id, linked_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(provider, subject) DO NOTHING
            "#,
        )
        .bind(identity.provider.as_str())
        .bind(&identity.subject_id)
        .bind(user_id.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

        if inserted == 0 {
            // Another caller linked the pair first; theirs wins.
            tx.rollback().await.map_err(db_error)?;
            tracing::debug!(provider = %identity.provider, "Identity linked concurrently");
            return self
                .owner_of(&identity)
                .await?
                .ok_or(Error::Storage(StorageError::NotFound));
        }

        tx.commit().await.map_err(db_error)?;

        if existing.is_some() {
            tracing::info!(user_id = %user_id, provider = %identity.provider, "Linked identity to existing user");
        } else {
            tracing::info!(user_id = %user_id, provider = %identity.provider, "Created user");
        }

        self.get(&user_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }
}
