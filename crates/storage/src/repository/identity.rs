use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::{Identity, IdentityId, UpsertOutcome};

pub struct IdentityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdentityRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all registered identities
    pub async fn list(&self) -> Result<Vec<Identity>> {
        let identities = sqlx::query_as::<_, Identity>(
            r#"
            SELECT identity_id, account_name, registered_at
            FROM identities
            ORDER BY identity_id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(identities)
    }

    pub async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT identity_id, account_name, registered_at
            FROM identities
            WHERE identity_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(identity)
    }

    /// Chess.com usernames are case-insensitive
    pub async fn find_by_account_name(&self, account_name: &str) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT identity_id, account_name, registered_at
            FROM identities
            WHERE lower(account_name) = lower($1)
            ORDER BY identity_id
            LIMIT 1
            "#,
        )
        .bind(account_name)
        .fetch_optional(self.pool)
        .await?;

        Ok(identity)
    }

    /// Insert the identity, or rename it if it is already registered.
    /// The original registration time is kept on rename.
    pub async fn upsert(&self, id: IdentityId, account_name: &str) -> Result<UpsertOutcome> {
        // xmax is zero only for rows created by this statement
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO identities (identity_id, account_name, registered_at)
            VALUES ($1, $2, now())
            ON CONFLICT (identity_id) DO UPDATE
                SET account_name = EXCLUDED.account_name
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(id)
        .bind(account_name)
        .fetch_one(self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    /// Delete an identity together with all of its snapshots
    pub async fn delete(&self, id: IdentityId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM rating_snapshots WHERE identity_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM identities WHERE identity_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StorageError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
