use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::{IdentityId, RatingSnapshot, RatingValues};

pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The authoritative snapshot: highest `updated_at`, newest id on ties.
    pub async fn find_latest(&self, identity_id: IdentityId) -> Result<Option<RatingSnapshot>> {
        let snapshot = sqlx::query_as::<_, RatingSnapshot>(
            r#"
            SELECT snapshot_id, identity_id, rapid, blitz, bullet, puzzle, puzzle_rush, updated_at
            FROM rating_snapshots
            WHERE identity_id = $1
            ORDER BY updated_at DESC, snapshot_id DESC
            LIMIT 1
            "#,
        )
        .bind(identity_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Overwrite the latest snapshot in place, or insert the first one.
    /// Runs in a transaction so a failure leaves the previous record intact.
    pub async fn upsert_latest(
        &self,
        identity_id: IdentityId,
        values: &RatingValues,
    ) -> Result<RatingSnapshot> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT snapshot_id
            FROM rating_snapshots
            WHERE identity_id = $1
            ORDER BY updated_at DESC, snapshot_id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(identity_id)
        .fetch_optional(&mut *tx)
        .await?;

        let result = match existing {
            Some(snapshot_id) => {
                sqlx::query_as::<_, RatingSnapshot>(
                    r#"
                    UPDATE rating_snapshots
                    SET rapid = $2, blitz = $3, bullet = $4, puzzle = $5, puzzle_rush = $6,
                        updated_at = now()
                    WHERE snapshot_id = $1
                    RETURNING snapshot_id, identity_id, rapid, blitz, bullet, puzzle, puzzle_rush, updated_at
                    "#,
                )
                .bind(snapshot_id)
                .bind(values.rapid)
                .bind(values.blitz)
                .bind(values.bullet)
                .bind(values.puzzle)
                .bind(values.puzzle_rush)
                .fetch_one(&mut *tx)
                .await
            }
            None => {
                sqlx::query_as::<_, RatingSnapshot>(
                    r#"
                    INSERT INTO rating_snapshots
                        (identity_id, rapid, blitz, bullet, puzzle, puzzle_rush, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, now())
                    RETURNING snapshot_id, identity_id, rapid, blitz, bullet, puzzle, puzzle_rush, updated_at
                    "#,
                )
                .bind(identity_id)
                .bind(values.rapid)
                .bind(values.blitz)
                .bind(values.bullet)
                .bind(values.puzzle)
                .bind(values.puzzle_rush)
                .fetch_one(&mut *tx)
                .await
            }
        };

        match result {
            Ok(snapshot) => {
                tx.commit().await?;
                Ok(snapshot)
            }
            Err(e) => {
                // report the write error, not a secondary rollback failure
                let _ = tx.rollback().await;
                Err(StorageError::from(e).for_snapshot_write(identity_id))
            }
        }
    }
}
