use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use storage::models::IdentityId;
use tokio::sync::Mutex;

use crate::error::{ImporterError, Result};
use crate::traits::MemberDirectory;

#[derive(Default)]
struct Members {
    roles: BTreeMap<IdentityId, BTreeSet<String>>,
    failing: HashSet<IdentityId>,
}

/// Member directory held in memory. Members must be added with `join`
/// before they can receive roles.
#[derive(Default)]
pub struct InMemoryMemberDirectory {
    members: Mutex<Members>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, member: IdentityId, roles: &[&str]) {
        let mut members = self.members.lock().await;
        members
            .roles
            .insert(member, roles.iter().map(|r| r.to_string()).collect());
    }

    /// Make every role change for `member` fail.
    pub async fn fail_changes_for(&self, member: IdentityId) {
        self.members.lock().await.failing.insert(member);
    }

    pub async fn roles_of(&self, member: IdentityId) -> BTreeSet<String> {
        let members = self.members.lock().await;
        members.roles.get(&member).cloned().unwrap_or_default()
    }

    async fn change(&self, member: IdentityId, role: &str, add: bool) -> Result<()> {
        let mut members = self.members.lock().await;
        if members.failing.contains(&member) {
            return Err(ImporterError::MembershipError(format!(
                "refused role change for {}",
                member
            )));
        }
        let roles = members
            .roles
            .get_mut(&member)
            .ok_or(ImporterError::MemberNotFound(member))?;
        if add {
            roles.insert(role.to_string());
        } else {
            roles.remove(role);
        }
        Ok(())
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn list_members_with_role(&self, role: &str) -> Result<Vec<IdentityId>> {
        let members = self.members.lock().await;
        Ok(members
            .roles
            .iter()
            .filter(|(_, roles)| roles.contains(role))
            .map(|(id, _)| *id)
            .collect())
    }

    async fn add_role(&self, member: IdentityId, role: &str) -> Result<()> {
        self.change(member, role, true).await
    }

    async fn remove_role(&self, member: IdentityId, role: &str) -> Result<()> {
        self.change(member, role, false).await
    }
}
