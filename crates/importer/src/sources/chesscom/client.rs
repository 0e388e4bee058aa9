use std::time::Duration;

use reqwest::{Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{PlayerProfile, PlayerStats};
use crate::error::{ImporterError, Result};

pub const DEFAULT_USER_AGENT: &str = "chess-ladder/0.1 (+https://github.com/chess-ladder)";
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

pub struct ChessComClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChessComClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_base_url("https://api.chess.com", user_agent)
    }

    pub fn with_base_url(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<PlayerProfile> {
        let url = format!("{}/pub/player/{}", self.base_url, username);
        self.get_json(username, &url).await
    }

    pub async fn fetch_stats(&self, username: &str) -> Result<PlayerStats> {
        let url = format!("{}/pub/player/{}/stats", self.base_url, username);
        self.get_json(username, &url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, username: &str, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImporterError::Transient(e.to_string()))?;

        let response = classify(username, response)?;
        let body = response
            .text()
            .await
            .map_err(|e| ImporterError::Transient(e.to_string()))?;

        Ok(serde_json::from_str(&body)?)
    }
}

fn classify(username: &str, response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ImporterError::NotFound(username.to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            Err(ImporterError::RateLimited { retry_after })
        }
        status => Err(ImporterError::Transient(format!(
            "unexpected status {} for '{}'",
            status, username
        ))),
    }
}

/// Only the delta-seconds form is understood.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ChessComClient {
        ChessComClient::with_base_url(server.uri(), DEFAULT_USER_AGENT).unwrap()
    }

    async fn respond(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(" 120 "), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let server = MockServer::start().await;
        respond(&server, "/pub/player/ghost", ResponseTemplate::new(404)).await;

        let result = client_for(&server).await.fetch_profile("ghost").await;

        assert!(matches!(result, Err(ImporterError::NotFound(name)) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_rate_limit_uses_retry_after_header() {
        let server = MockServer::start().await;
        respond(
            &server,
            "/pub/player/alice/stats",
            ResponseTemplate::new(429).insert_header("Retry-After", "7"),
        )
        .await;

        let result = client_for(&server).await.fetch_stats("alice").await;

        assert!(matches!(
            result,
            Err(ImporterError::RateLimited { retry_after }) if retry_after == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_without_header_waits_a_minute() {
        let server = MockServer::start().await;
        respond(&server, "/pub/player/alice/stats", ResponseTemplate::new(429)).await;

        let result = client_for(&server).await.fetch_stats("alice").await;

        assert!(matches!(
            result,
            Err(ImporterError::RateLimited { retry_after }) if retry_after == DEFAULT_RETRY_AFTER
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        respond(&server, "/pub/player/alice", ResponseTemplate::new(500)).await;

        let result = client_for(&server).await.fetch_profile("alice").await;

        assert!(matches!(result, Err(ImporterError::Transient(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let client = ChessComClient::with_base_url("http://127.0.0.1:1", DEFAULT_USER_AGENT).unwrap();

        let result = client.fetch_profile("alice").await;

        assert!(matches!(result, Err(ImporterError::Transient(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;
        respond(
            &server,
            "/pub/player/alice/stats",
            ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        )
        .await;

        let result = client_for(&server).await.fetch_stats("alice").await;

        assert!(matches!(result, Err(ImporterError::ParseError(_))));
    }
}
