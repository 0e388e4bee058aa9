//! Process-local [`RatingStore`] for development runs and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{Result, StorageError};
use crate::models::{Identity, IdentityId, RatingSnapshot, RatingValues, SnapshotRow, UpsertOutcome};
use crate::store::RatingStore;

#[derive(Default)]
struct Tables {
    identities: BTreeMap<IdentityId, Identity>,
    snapshots: Vec<RatingSnapshot>,
    next_snapshot_id: i64,
}

impl Tables {
    fn latest_index(&self, id: IdentityId) -> Option<usize> {
        self.snapshots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.identity_id == id)
            .max_by_key(|(_, s)| (s.updated_at, s.snapshot_id))
            .map(|(idx, _)| idx)
    }

    fn push_snapshot(&mut self, id: IdentityId, values: RatingValues, at: DateTime<Utc>) -> RatingSnapshot {
        self.next_snapshot_id += 1;
        let snapshot = RatingSnapshot {
            snapshot_id: self.next_snapshot_id,
            identity_id: id,
            values,
            updated_at: at,
        };
        self.snapshots.push(snapshot.clone());
        snapshot
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot with an explicit timestamp, keeping older ones as
    /// history. Used to seed data; regular writes go through `upsert_snapshot`.
    pub async fn append_snapshot(
        &self,
        id: IdentityId,
        values: RatingValues,
        at: DateTime<Utc>,
    ) -> Result<RatingSnapshot> {
        let mut tables = self.tables.write().await;
        if !tables.identities.contains_key(&id) {
            return Err(StorageError::UnknownIdentity(id));
        }
        Ok(tables.push_snapshot(id, values, at))
    }

    pub async fn snapshot_count(&self, id: IdentityId) -> usize {
        let tables = self.tables.read().await;
        tables.snapshots.iter().filter(|s| s.identity_id == id).count()
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self.tables.read().await.identities.get(&id).cloned())
    }

    async fn find_identity_by_name(&self, account_name: &str) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .identities
            .values()
            .find(|i| i.account_name.eq_ignore_ascii_case(account_name))
            .cloned())
    }

    async fn list_identities(&self) -> Result<Vec<Identity>> {
        Ok(self.tables.read().await.identities.values().cloned().collect())
    }

    async fn upsert_identity(&self, id: IdentityId, account_name: &str) -> Result<UpsertOutcome> {
        let mut tables = self.tables.write().await;
        match tables.identities.get_mut(&id) {
            Some(existing) => {
                existing.account_name = account_name.to_string();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                tables.identities.insert(
                    id,
                    Identity {
                        identity_id: id,
                        account_name: account_name.to_string(),
                        registered_at: Utc::now(),
                    },
                );
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn delete_identity(&self, id: IdentityId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.identities.remove(&id).is_none() {
            return Ok(false);
        }
        tables.snapshots.retain(|s| s.identity_id != id);
        Ok(true)
    }

    async fn get_latest_snapshot(&self, id: IdentityId) -> Result<Option<RatingSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.latest_index(id).map(|idx| tables.snapshots[idx].clone()))
    }

    async fn upsert_snapshot(&self, id: IdentityId, values: &RatingValues) -> Result<RatingSnapshot> {
        let mut tables = self.tables.write().await;
        if !tables.identities.contains_key(&id) {
            return Err(StorageError::UnknownIdentity(id));
        }

        let now = Utc::now();
        match tables.latest_index(id) {
            Some(idx) => {
                let snapshot = &mut tables.snapshots[idx];
                snapshot.values = *values;
                // never move the authoritative record behind a history entry
                snapshot.updated_at = now.max(snapshot.updated_at);
                Ok(snapshot.clone())
            }
            None => Ok(tables.push_snapshot(id, *values, now)),
        }
    }

    async fn list_latest_snapshots(&self) -> Result<Vec<SnapshotRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .identities
            .values()
            .filter_map(|identity| {
                tables.latest_index(identity.identity_id).map(|idx| {
                    let snapshot = &tables.snapshots[idx];
                    SnapshotRow {
                        identity_id: identity.identity_id,
                        account_name: identity.account_name.clone(),
                        values: snapshot.values,
                        updated_at: snapshot.updated_at,
                    }
                })
            })
            .collect())
    }
}
