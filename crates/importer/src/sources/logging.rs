use async_trait::async_trait;
use storage::models::IdentityId;
use tracing::info;

use crate::Result;
use crate::traits::MemberDirectory;

/// Stand-in when no guild is configured: nobody holds a role and changes
/// are only logged.
#[derive(Debug, Default)]
pub struct LoggingMemberDirectory;

#[async_trait]
impl MemberDirectory for LoggingMemberDirectory {
    async fn list_members_with_role(&self, _role: &str) -> Result<Vec<IdentityId>> {
        Ok(Vec::new())
    }

    async fn add_role(&self, member: IdentityId, role: &str) -> Result<()> {
        info!("Would add role '{}' to {}", role, member);
        Ok(())
    }

    async fn remove_role(&self, member: IdentityId, role: &str) -> Result<()> {
        info!("Would remove role '{}' from {}", role, member);
        Ok(())
    }
}
