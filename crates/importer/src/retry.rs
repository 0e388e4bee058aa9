use std::time::Duration;

use storage::models::RatingValues;
use tracing::warn;

use crate::error::{ImporterError, Result};
use crate::traits::RatingSource;

/// Bounds for waiting out rate limits on a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_total_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_total_backoff: Duration::from_secs(300),
        }
    }
}

/// Fetch `username`, sleeping through `RateLimited` responses until either
/// bound of `policy` is reached. Every other error is returned as is.
pub async fn fetch_with_retry(
    source: &dyn RatingSource,
    username: &str,
    policy: RetryPolicy,
) -> Result<RatingValues> {
    let mut waited = Duration::ZERO;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match source.fetch_ratings(username).await {
            Err(ImporterError::RateLimited { retry_after }) => {
                if attempt >= policy.max_attempts || waited + retry_after > policy.max_total_backoff {
                    warn!(
                        "Giving up on {} after {} attempts ({:?} spent waiting)",
                        username, attempt, waited
                    );
                    return Err(ImporterError::RetriesExhausted {
                        username: username.to_string(),
                        attempts: attempt,
                    });
                }

                warn!(
                    "Rate limited fetching {}, retrying in {:?} (attempt {}/{})",
                    username, retry_after, attempt, policy.max_attempts
                );
                tokio::time::sleep(retry_after).await;
                waited += retry_after;
            }
            other => return other,
        }
    }
}
