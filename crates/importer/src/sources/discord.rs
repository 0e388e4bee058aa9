use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use storage::models::IdentityId;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ImporterError, Result};
use crate::traits::MemberDirectory;

const API_BASE: &str = "https://discord.com/api/v10";
const MEMBER_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
struct GuildRole {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    user: Option<MemberUser>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MemberUser {
    id: String,
}

/// Tier roles on a Discord guild through the bot REST API. Role names are
/// resolved to ids once and cached.
pub struct DiscordMemberDirectory {
    client: reqwest::Client,
    api_base: String,
    token: String,
    guild_id: String,
    role_ids: RwLock<HashMap<String, String>>,
}

impl DiscordMemberDirectory {
    pub fn new(token: impl Into<String>, guild_id: impl Into<String>) -> Result<Self> {
        Self::with_api_base(API_BASE, token, guild_id)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
            guild_id: guild_id.into(),
            role_ids: RwLock::new(HashMap::new()),
        })
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}/guilds/{}{}", self.api_base, self.guild_id, path);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await?;

        Ok(response)
    }

    async fn role_id(&self, role: &str) -> Result<String> {
        if let Some(id) = self.role_ids.read().await.get(role) {
            return Ok(id.clone());
        }

        let response = self.send(Method::GET, "/roles").await?;
        if !response.status().is_success() {
            return Err(ImporterError::MembershipError(format!(
                "listing guild roles returned {}",
                response.status()
            )));
        }
        let roles: Vec<GuildRole> = response.json().await?;

        let mut cache = self.role_ids.write().await;
        for r in roles {
            cache.insert(r.name, r.id);
        }

        cache
            .get(role)
            .cloned()
            .ok_or_else(|| ImporterError::MembershipError(format!("role '{}' does not exist", role)))
    }

    async fn change_role(&self, method: Method, member: IdentityId, role: &str) -> Result<()> {
        let role_id = self.role_id(role).await?;
        let path = format!("/members/{}/roles/{}", member, role_id);
        let response = self.send(method, &path).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ImporterError::MemberNotFound(member)),
            status => Err(ImporterError::MembershipError(format!(
                "changing role '{}' for {} returned {}",
                role, member, status
            ))),
        }
    }
}

#[async_trait]
impl MemberDirectory for DiscordMemberDirectory {
    async fn list_members_with_role(&self, role: &str) -> Result<Vec<IdentityId>> {
        let role_id = self.role_id(role).await?;
        let mut holders = Vec::new();
        let mut after = String::from("0");

        loop {
            let path = format!("/members?limit={}&after={}", MEMBER_PAGE_LIMIT, after);
            let response = self.send(Method::GET, &path).await?;
            if !response.status().is_success() {
                return Err(ImporterError::MembershipError(format!(
                    "listing guild members returned {}",
                    response.status()
                )));
            }
            let page: Vec<GuildMember> = response.json().await?;
            let page_len = page.len();

            for member in page {
                let Some(user) = member.user else { continue };
                if member.roles.iter().any(|r| *r == role_id) {
                    if let Ok(id) = user.id.parse::<IdentityId>() {
                        holders.push(id);
                    }
                }
                after = user.id;
            }

            if page_len < MEMBER_PAGE_LIMIT {
                break;
            }
        }

        Ok(holders)
    }

    async fn add_role(&self, member: IdentityId, role: &str) -> Result<()> {
        self.change_role(Method::PUT, member, role).await
    }

    async fn remove_role(&self, member: IdentityId, role: &str) -> Result<()> {
        self.change_role(Method::DELETE, member, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn guild_with_roles() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/g1/roles"))
            .and(header("authorization", "Bot t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "9", "name": "Top 5"},
                {"id": "10", "name": "Top 10"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    fn directory_for(server: &MockServer) -> DiscordMemberDirectory {
        DiscordMemberDirectory::with_api_base(server.uri(), "t0ken", "g1").unwrap()
    }

    #[tokio::test]
    async fn test_role_change_for_departed_member_is_member_not_found() {
        let server = guild_with_roles().await;
        Mock::given(method("PUT"))
            .and(path("/guilds/g1/members/42/roles/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = directory_for(&server).add_role(IdentityId(42), "Top 5").await;

        assert!(matches!(result, Err(ImporterError::MemberNotFound(IdentityId(42)))));
    }

    #[tokio::test]
    async fn test_role_ids_are_resolved_once() {
        let server = guild_with_roles().await;
        Mock::given(method("PUT"))
            .and(path("/guilds/g1/members/7/roles/9"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/guilds/g1/members/7/roles/9"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let directory = directory_for(&server);
        directory.add_role(IdentityId(7), "Top 5").await.unwrap();
        directory.remove_role(IdentityId(7), "Top 5").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_role_name_is_a_membership_error() {
        let server = guild_with_roles().await;

        let result = directory_for(&server).add_role(IdentityId(7), "Top 100").await;

        assert!(matches!(result, Err(ImporterError::MembershipError(_))));
    }

    #[tokio::test]
    async fn test_lists_only_holders_of_the_role() {
        let server = guild_with_roles().await;
        Mock::given(method("GET"))
            .and(path("/guilds/g1/members"))
            .and(query_param("after", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user": {"id": "101"}, "roles": ["9"]},
                {"user": {"id": "102"}, "roles": ["10"]},
                {"user": {"id": "103"}, "roles": ["10", "9"]}
            ])))
            .mount(&server)
            .await;

        let holders = directory_for(&server)
            .list_members_with_role("Top 5")
            .await
            .unwrap();

        assert_eq!(holders, vec![IdentityId(101), IdentityId(103)]);
    }

    #[test]
    fn test_decodes_member_page() {
        let json = r#"[
            {"user": {"id": "101", "username": "a"}, "roles": ["9", "10"], "nick": null},
            {"user": {"id": "102", "username": "b"}, "roles": []},
            {"roles": ["9"]}
        ]"#;

        let page: Vec<GuildMember> = serde_json::from_str(json).unwrap();

        assert_eq!(page.len(), 3);
        assert_eq!(page[0].user.as_ref().unwrap().id, "101");
        assert_eq!(page[0].roles, vec!["9", "10"]);
        assert!(page[2].user.is_none());
    }
}
