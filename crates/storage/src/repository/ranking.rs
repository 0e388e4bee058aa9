use sqlx::PgPool;

use crate::error::Result;
use crate::models::SnapshotRow;

pub struct RankingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every identity that has at least one snapshot, paired with its most
    /// recent one. Ordered by identity id so ranking ties stay deterministic.
    pub async fn latest_snapshots(&self) -> Result<Vec<SnapshotRow>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT DISTINCT ON (i.identity_id)
                i.identity_id,
                i.account_name,
                r.rapid,
                r.blitz,
                r.bullet,
                r.puzzle,
                r.puzzle_rush,
                r.updated_at
            FROM identities i
            INNER JOIN rating_snapshots r ON r.identity_id = i.identity_id
            ORDER BY i.identity_id, r.updated_at DESC, r.snapshot_id DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
