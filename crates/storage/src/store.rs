use async_trait::async_trait;

use crate::Database;
use crate::error::{Result, StorageError};
use crate::models::{Identity, IdentityId, RatingSnapshot, RatingValues, SnapshotRow, UpsertOutcome};
use crate::repository::{
    identity::IdentityRepository, ranking::RankingRepository, rating::RatingRepository,
};

/// Identity and rating persistence used by the API and the sync scheduler.
///
/// Each call is atomic on its own; nothing spans several calls, so readers
/// may observe a sweep half way through.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>>;

    async fn find_identity_by_name(&self, account_name: &str) -> Result<Option<Identity>>;

    async fn list_identities(&self) -> Result<Vec<Identity>>;

    async fn upsert_identity(&self, id: IdentityId, account_name: &str) -> Result<UpsertOutcome>;

    /// Removes the identity and its snapshots. Returns false if it was not registered.
    async fn delete_identity(&self, id: IdentityId) -> Result<bool>;

    /// Removes the identity linked to `account_name`, if any.
    async fn delete_identity_by_name(&self, account_name: &str) -> Result<Option<IdentityId>> {
        match self.find_identity_by_name(account_name).await? {
            Some(identity) => Ok(self
                .delete_identity(identity.identity_id)
                .await?
                .then_some(identity.identity_id)),
            None => Ok(None),
        }
    }

    async fn get_latest_snapshot(&self, id: IdentityId) -> Result<Option<RatingSnapshot>>;

    /// Updates the latest snapshot in place or inserts the first one.
    async fn upsert_snapshot(&self, id: IdentityId, values: &RatingValues) -> Result<RatingSnapshot>;

    async fn list_latest_snapshots(&self) -> Result<Vec<SnapshotRow>>;
}

#[async_trait]
impl RatingStore for Database {
    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>> {
        IdentityRepository::new(self.pool()).find_by_id(id).await
    }

    async fn find_identity_by_name(&self, account_name: &str) -> Result<Option<Identity>> {
        IdentityRepository::new(self.pool())
            .find_by_account_name(account_name)
            .await
    }

    async fn list_identities(&self) -> Result<Vec<Identity>> {
        IdentityRepository::new(self.pool()).list().await
    }

    async fn upsert_identity(&self, id: IdentityId, account_name: &str) -> Result<UpsertOutcome> {
        IdentityRepository::new(self.pool())
            .upsert(id, account_name)
            .await
    }

    async fn delete_identity(&self, id: IdentityId) -> Result<bool> {
        match IdentityRepository::new(self.pool()).delete(id).await {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_latest_snapshot(&self, id: IdentityId) -> Result<Option<RatingSnapshot>> {
        RatingRepository::new(self.pool()).find_latest(id).await
    }

    async fn upsert_snapshot(&self, id: IdentityId, values: &RatingValues) -> Result<RatingSnapshot> {
        RatingRepository::new(self.pool())
            .upsert_latest(id, values)
            .await
    }

    async fn list_latest_snapshots(&self) -> Result<Vec<SnapshotRow>> {
        RankingRepository::new(self.pool()).latest_snapshots().await
    }
}
