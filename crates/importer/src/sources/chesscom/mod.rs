mod client;
mod models;

pub use client::{ChessComClient, DEFAULT_USER_AGENT};
pub use models::*;

use async_trait::async_trait;
use storage::models::RatingValues;
use tracing::debug;

use crate::{Result, traits::RatingSource};

/// Chess.com public API. The profile call confirms the account exists before
/// stats are read, since `/stats` answers for some closed accounts.
pub struct ChessComSource {
    client: ChessComClient,
}

impl ChessComSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        Ok(Self::with_client(ChessComClient::new(user_agent)?))
    }

    pub fn with_client(client: ChessComClient) -> Self {
        Self { client }
    }

    pub fn profile_url(username: &str) -> String {
        format!("https://www.chess.com/member/{}", username)
    }
}

#[async_trait]
impl RatingSource for ChessComSource {
    async fn fetch_ratings(&self, username: &str) -> Result<RatingValues> {
        self.client.fetch_profile(username).await?;
        let stats = self.client.fetch_stats(username).await?;
        let values = RatingValues::from(&stats);
        debug!("Fetched ratings for {}: {:?}", username, values);
        Ok(values)
    }

    fn name(&self) -> &'static str {
        "Chess.com"
    }
}
