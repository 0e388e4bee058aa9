use async_trait::async_trait;
use storage::models::{IdentityId, RatingValues};

use crate::Result;

/// Where ratings come from.
#[async_trait]
pub trait RatingSource: Send + Sync {
    /// Current ratings for `username`. Fails with `NotFound`, `RateLimited`
    /// or a transient error; never retries on its own.
    async fn fetch_ratings(&self, username: &str) -> Result<RatingValues>;

    fn name(&self) -> &'static str;
}

/// Group membership used to hand out tier roles. Every call stands alone,
/// so one failing member never blocks the others.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn list_members_with_role(&self, role: &str) -> Result<Vec<IdentityId>>;

    async fn add_role(&self, member: IdentityId, role: &str) -> Result<()>;

    async fn remove_role(&self, member: IdentityId, role: &str) -> Result<()>;
}
