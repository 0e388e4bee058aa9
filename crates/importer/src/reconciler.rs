use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::Serialize;
use storage::dto::ranking::RankedEntry;
use storage::models::IdentityId;
use tracing::{error, info, warn};

use crate::error::ImporterError;
use crate::traits::MemberDirectory;

/// Leaderboard bands that come with a role. Bands do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Top5,
    Top10,
    Top25,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Top5, Self::Top10, Self::Top25];

    /// 1-based ranks covered by the tier.
    pub fn ranks(&self) -> RangeInclusive<usize> {
        match self {
            Self::Top5 => 1..=5,
            Self::Top10 => 6..=10,
            Self::Top25 => 11..=25,
        }
    }
}

/// Role name for each tier in the member directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRoles {
    pub top5: String,
    pub top10: String,
    pub top25: String,
}

impl TierRoles {
    pub fn role(&self, tier: Tier) -> &str {
        match tier {
            Tier::Top5 => &self.top5,
            Tier::Top10 => &self.top10,
            Tier::Top25 => &self.top25,
        }
    }
}

impl Default for TierRoles {
    fn default() -> Self {
        Self {
            top5: "Top 5".to_string(),
            top10: "Top 10".to_string(),
            top25: "Top 25".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ReconcileReport {
    fn record(&mut self, result: Result<(), ImporterError>, member: IdentityId, role: &str, adding: bool) {
        let verb = if adding { "add" } else { "remove" };
        match result {
            Ok(()) => {
                if adding {
                    self.added += 1;
                } else {
                    self.removed += 1;
                }
            }
            Err(ImporterError::MemberNotFound(_)) => {
                warn!("Cannot {} role '{}': member {} not found", verb, role, member);
                self.skipped += 1;
            }
            Err(e) => {
                error!("Failed to {} role '{}' for {}: {}", verb, role, member, e);
                self.failed += 1;
            }
        }
    }
}

/// Brings tier role membership in line with the `overall` ranking, touching
/// only members whose role has to change.
pub struct RoleReconciler {
    directory: Arc<dyn MemberDirectory>,
    roles: TierRoles,
}

impl RoleReconciler {
    pub fn new(directory: Arc<dyn MemberDirectory>, roles: TierRoles) -> Self {
        Self { directory, roles }
    }

    pub async fn reconcile(&self, ranking: &[RankedEntry]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for tier in Tier::ALL {
            let role = self.roles.role(tier);
            let band: HashSet<IdentityId> = ranking
                .iter()
                .enumerate()
                .filter(|(idx, _)| tier.ranks().contains(&(idx + 1)))
                .map(|(_, entry)| entry.identity_id)
                .collect();

            let holders: Option<HashSet<IdentityId>> =
                match self.directory.list_members_with_role(role).await {
                    Ok(holders) => Some(holders.into_iter().collect()),
                    Err(e) => {
                        error!("Could not list holders of '{}', skipping removals: {}", role, e);
                        report.failed += 1;
                        None
                    }
                };

            if let Some(holders) = &holders {
                for member in holders.difference(&band) {
                    let result = self.directory.remove_role(*member, role).await;
                    report.record(result, *member, role, false);
                }
            }

            // ranking order keeps role changes deterministic
            for entry in ranking.iter().filter(|e| band.contains(&e.identity_id)) {
                let member = entry.identity_id;
                if holders.as_ref().is_some_and(|h| h.contains(&member)) {
                    continue;
                }
                let result = self.directory.add_role(member, role).await;
                report.record(result, member, role, true);
            }
        }

        info!(
            "Role reconciliation: {} added, {} removed, {} failed, {} skipped",
            report.added, report.removed, report.failed, report.skipped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::InMemoryMemberDirectory;
    use storage::models::RatingValues;

    fn ranking(ids: &[i64]) -> Vec<RankedEntry> {
        ids.iter()
            .enumerate()
            .map(|(idx, id)| RankedEntry {
                rank: idx as i64 + 1,
                identity_id: IdentityId(*id),
                display_name: format!("player{id}"),
                values: RatingValues::default(),
                score: 2000.0 - idx as f64,
            })
            .collect()
    }

    fn roles() -> TierRoles {
        TierRoles::default()
    }

    async fn directory_for(ids: &[i64]) -> Arc<InMemoryMemberDirectory> {
        let directory = Arc::new(InMemoryMemberDirectory::new());
        for id in ids {
            directory.join(IdentityId(*id), &[]).await;
        }
        directory
    }

    #[test]
    fn test_tier_bands_do_not_overlap() {
        assert!(Tier::Top5.ranks().contains(&5));
        assert!(!Tier::Top5.ranks().contains(&6));
        assert!(Tier::Top10.ranks().contains(&6));
        assert!(Tier::Top25.ranks().contains(&25));
        assert!(!Tier::Top25.ranks().contains(&26));
    }

    #[tokio::test]
    async fn test_climb_from_seven_to_three_swaps_roles_only_where_needed() {
        let ids: Vec<i64> = (1..=12).collect();
        let directory = directory_for(&ids).await;
        let reconciler = RoleReconciler::new(directory.clone(), roles());

        // Y (id 7) sits at rank 7
        reconciler.reconcile(&ranking(&ids)).await;
        assert!(directory.roles_of(IdentityId(7)).await.contains("Top 10"));

        // Y climbs to rank 3; ids 3..=6 each drop one place
        let after: Vec<i64> = vec![1, 2, 7, 3, 4, 5, 6, 8, 9, 10, 11, 12];
        let before_roles: Vec<_> = {
            let mut v = Vec::new();
            for id in &ids {
                v.push((*id, directory.roles_of(IdentityId(*id)).await));
            }
            v
        };

        let report = reconciler.reconcile(&ranking(&after)).await;

        let y = directory.roles_of(IdentityId(7)).await;
        assert!(y.contains("Top 5"));
        assert!(!y.contains("Top 10"));

        // id 5 falls from rank 5 to rank 6 and therefore moves into Top 10
        let five = directory.roles_of(IdentityId(5)).await;
        assert!(five.contains("Top 10"));
        assert!(!five.contains("Top 5"));

        for (id, roles) in before_roles {
            if id == 7 || id == 5 {
                continue;
            }
            assert_eq!(directory.roles_of(IdentityId(id)).await, roles, "id {id} changed");
        }

        assert_eq!(report.added, 2);
        assert_eq!(report.removed, 2);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_rank_change_within_band_changes_nothing() {
        let ids: Vec<i64> = (1..=10).collect();
        let directory = directory_for(&ids).await;
        let reconciler = RoleReconciler::new(directory.clone(), roles());
        reconciler.reconcile(&ranking(&ids)).await;

        let reshuffled: Vec<i64> = vec![3, 1, 2, 5, 4, 10, 9, 8, 7, 6];
        let report = reconciler.reconcile(&ranking(&reshuffled)).await;

        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_failure_on_one_member_does_not_stop_the_rest() {
        let ids: Vec<i64> = (1..=6).collect();
        let directory = directory_for(&ids).await;
        directory.fail_changes_for(IdentityId(2)).await;
        let reconciler = RoleReconciler::new(directory.clone(), roles());

        let report = reconciler.reconcile(&ranking(&ids)).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.added, 5);
        assert!(directory.roles_of(IdentityId(1)).await.contains("Top 5"));
        assert!(directory.roles_of(IdentityId(3)).await.contains("Top 5"));
        assert!(directory.roles_of(IdentityId(6)).await.contains("Top 10"));
    }

    #[tokio::test]
    async fn test_unknown_members_are_skipped() {
        let directory = directory_for(&[1, 3]).await;
        let reconciler = RoleReconciler::new(directory.clone(), roles());

        let report = reconciler.reconcile(&ranking(&[1, 2, 3])).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.added, 2);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_dropping_out_of_all_bands_removes_the_role() {
        let ids: Vec<i64> = (1..=26).collect();
        let directory = directory_for(&ids).await;
        let reconciler = RoleReconciler::new(directory.clone(), roles());
        reconciler.reconcile(&ranking(&ids)).await;
        assert!(directory.roles_of(IdentityId(25)).await.contains("Top 25"));
        assert!(directory.roles_of(IdentityId(26)).await.is_empty());

        let mut after = ids.clone();
        after.swap(24, 25);
        let report = reconciler.reconcile(&ranking(&after)).await;

        assert!(directory.roles_of(IdentityId(25)).await.is_empty());
        assert!(directory.roles_of(IdentityId(26)).await.contains("Top 25"));
        assert_eq!(report.added, 1);
        assert_eq!(report.removed, 1);
    }
}
