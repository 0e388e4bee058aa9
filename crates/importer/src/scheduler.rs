use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::RatingStore;
use storage::dto::ranking::Category;
use storage::models::{Identity, IdentityId, RatingSnapshot, RatingValues};
use storage::services::aggregation;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::error::{ImporterError, Result};
use crate::reconciler::{ReconcileReport, RoleReconciler, TierRoles};
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::traits::{MemberDirectory, RatingSource};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub interval: Duration,
    pub request_delay: Duration,
    pub retry: RetryPolicy,
    pub roles: TierRoles,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            request_delay: Duration::from_secs(2),
            retry: RetryPolicy::default(),
            roles: TierRoles::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub total: usize,
    pub updated: usize,
    /// Every identity that did not end up with fresh ratings, not-found
    /// accounts included.
    pub failed: usize,
    pub skipped_not_found: usize,
    pub reconciliation: ReconcileReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Shortest period the sweep loop will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Clears the in-progress flag however the sweep ends.
struct SweepGuard(Arc<AtomicBool>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodically refreshes every registered identity and reconciles tier roles.
pub struct SyncScheduler {
    store: Arc<dyn RatingStore>,
    source: Arc<dyn RatingSource>,
    reconciler: RoleReconciler,
    config: SyncConfig,
    in_progress: Arc<AtomicBool>,
}

impl SyncScheduler {
    pub fn new(
        store: Arc<dyn RatingStore>,
        source: Arc<dyn RatingSource>,
        directory: Arc<dyn MemberDirectory>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            source,
            reconciler: RoleReconciler::new(directory, config.roles.clone()),
            config,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    fn is_sweeping(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Fetch ratings for an account, waiting out rate limits.
    pub async fn fetch(&self, username: &str) -> Result<RatingValues> {
        fetch_with_retry(self.source.as_ref(), username, self.config.retry).await
    }

    /// One sweep step for a single registered identity, without the
    /// inter-request delay.
    pub async fn refresh_identity(&self, identity_id: IdentityId) -> Result<RatingSnapshot> {
        let identity = self
            .store
            .get_identity(identity_id)
            .await?
            .ok_or(storage::StorageError::UnknownIdentity(identity_id))?;

        self.refresh(&identity).await
    }

    async fn refresh(&self, identity: &Identity) -> Result<RatingSnapshot> {
        let values = self.fetch(&identity.account_name).await?;
        let snapshot = self
            .store
            .upsert_snapshot(identity.identity_id, &values)
            .await?;
        Ok(snapshot)
    }

    fn claim(&self) -> Result<SweepGuard> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Sweep requested while another is running, skipping");
            return Err(ImporterError::SweepInProgress);
        }
        Ok(SweepGuard(self.in_progress.clone()))
    }

    /// Run one sweep unless another is already running.
    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let _guard = self.claim()?;
        self.sweep().await
    }

    /// Claim the sweep right away and run it in the background. Fails with
    /// `SweepInProgress` without spawning anything if a sweep is running.
    pub fn spawn_sweep(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let guard = self.claim()?;

        Ok(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = self.sweep().await {
                error!("Rating sweep failed: {}", e);
            }
        }))
    }

    async fn sweep(&self) -> Result<SweepReport> {
        let started_at = Utc::now();
        let identities = self.store.list_identities().await?;
        info!(
            "Starting rating sweep for {} identities via {}",
            identities.len(),
            self.source.name()
        );

        let mut updated = 0;
        let mut failed = 0;
        let mut skipped_not_found = 0;

        for identity in &identities {
            tokio::time::sleep(self.config.request_delay).await;

            match self.refresh(identity).await {
                Ok(_) => updated += 1,
                Err(ImporterError::NotFound(username)) => {
                    warn!("Chess.com account '{}' no longer exists", username);
                    skipped_not_found += 1;
                    failed += 1;
                }
                Err(ImporterError::StorageError(e)) => {
                    error!("Failed to store ratings for {}: {}", identity.identity_id, e);
                    failed += 1;
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        "Failed to refresh {}, will retry next sweep: {}",
                        identity.account_name, e
                    );
                    failed += 1;
                }
                Err(e) => {
                    error!("Failed to refresh {}: {}", identity.account_name, e);
                    failed += 1;
                }
            }
        }

        let reconciliation = match self.store.list_latest_snapshots().await {
            Ok(rows) => {
                let ranking = aggregation::rank(Category::Overall, &rows);
                self.reconciler.reconcile(&ranking).await
            }
            Err(e) => {
                error!("Could not load rankings, skipping role reconciliation: {}", e);
                ReconcileReport::default()
            }
        };

        let report = SweepReport {
            total: identities.len(),
            updated,
            failed,
            skipped_not_found,
            reconciliation,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Sweep finished: {}/{} updated, {} failed ({} not found)",
            report.updated, report.total, report.failed, report.skipped_not_found
        );

        Ok(report)
    }

    /// Spawn the periodic sweep loop. The first sweep runs immediately.
    /// Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let period = if self.config.interval < MIN_SWEEP_INTERVAL {
            warn!(
                "Sweep interval {:?} is too short, using {:?}",
                self.config.interval, MIN_SWEEP_INTERVAL
            );
            MIN_SWEEP_INTERVAL
        } else {
            self.config.interval
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match self.run_sweep().await {
                    Ok(_) | Err(ImporterError::SweepInProgress) => {}
                    Err(e) => error!("Rating sweep failed: {}", e),
                }
            }
        })
    }
}
