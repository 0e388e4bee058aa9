use std::collections::HashSet;

use chrono::Utc;
use storage::{
    RatingStore,
    dto::ranking::{Category, RankedEntry},
    error::Result,
    services::aggregation,
};

use super::render::LeaderboardData;

/// Rank every identity's latest snapshot for `category`.
pub async fn get_ranking(store: &dyn RatingStore, category: Category) -> Result<Vec<RankedEntry>> {
    let rows = store.list_latest_snapshots().await?;
    Ok(aggregation::rank(category, &rows))
}

/// The footer date only considers snapshots that made it into the ranking.
pub async fn load_leaderboard(store: &dyn RatingStore, category: Category) -> Result<LeaderboardData> {
    let rows = store.list_latest_snapshots().await?;
    let entries = aggregation::rank(category, &rows);

    let ranked: HashSet<_> = entries.iter().map(|entry| entry.identity_id).collect();
    let last_updated = rows
        .iter()
        .filter(|row| ranked.contains(&row.identity_id))
        .map(|row| row.updated_at)
        .max()
        .unwrap_or_else(Utc::now);

    Ok(LeaderboardData {
        category,
        entries,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use storage::{
        InMemoryStore,
        models::{IdentityId, RatingValues},
    };

    #[tokio::test]
    async fn test_last_updated_ignores_unranked_snapshots() {
        let store = InMemoryStore::new();
        let older = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let newer = older + Duration::days(5);

        store.upsert_identity(IdentityId(1), "rapid_player").await.unwrap();
        store.upsert_identity(IdentityId(2), "blitz_only").await.unwrap();
        store
            .append_snapshot(
                IdentityId(1),
                RatingValues {
                    rapid: Some(1500),
                    ..Default::default()
                },
                older,
            )
            .await
            .unwrap();
        store
            .append_snapshot(
                IdentityId(2),
                RatingValues {
                    blitz: Some(1700),
                    ..Default::default()
                },
                newer,
            )
            .await
            .unwrap();

        let rapid = load_leaderboard(&store, Category::Rapid).await.unwrap();
        assert_eq!(rapid.entries.len(), 1);
        assert_eq!(rapid.last_updated, older);

        let overall = load_leaderboard(&store, Category::Overall).await.unwrap();
        assert_eq!(overall.entries.len(), 2);
        assert_eq!(overall.last_updated, newer);
    }

    #[tokio::test]
    async fn test_empty_leaderboard_has_no_entries() {
        let store = InMemoryStore::new();
        let before = Utc::now();

        let data = load_leaderboard(&store, Category::Bullet).await.unwrap();

        assert!(data.entries.is_empty());
        assert!(data.last_updated >= before);
    }
}
