use std::time::Duration;

use storage::models::IdentityId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Chess.com user '{0}' not found")]
    NotFound(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Transient upstream error: {0}")]
    Transient(String),

    #[error("Gave up on '{username}' after {attempts} attempts")]
    RetriesExhausted { username: String, attempts: u32 },

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Member {0} is not in the guild")]
    MemberNotFound(IdentityId),

    #[error("Membership update failed: {0}")]
    MembershipError(String),

    #[error("A sweep is already in progress")]
    SweepInProgress,
}

impl ImporterError {
    /// Upstream failures that are not the caller's fault and may go away on
    /// the next sweep.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transient(_)
                | Self::RequestError(_)
                | Self::ParseError(_)
                | Self::RetriesExhausted { .. }
        )
    }
}
