pub mod error;
pub mod reconciler;
pub mod retry;
pub mod scheduler;
pub mod sources;
pub mod traits;

#[cfg(test)]
mod testing;

pub use error::{ImporterError, Result};
pub use reconciler::{ReconcileReport, RoleReconciler, Tier, TierRoles};
pub use retry::{RetryPolicy, fetch_with_retry};
pub use scheduler::{SweepReport, SyncConfig, SyncScheduler};
pub use traits::{MemberDirectory, RatingSource};

pub use sources::{
    ChessComSource, DiscordMemberDirectory, InMemoryMemberDirectory, LoggingMemberDirectory,
};
