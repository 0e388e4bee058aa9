use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{IdentityId, RatingSnapshot, RatingValues, UpsertOutcome};

/// Link a chat identity to a Chess.com account.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    pub identity_id: IdentityId,
    #[validate(
        length(min = 3, max = 25, message = "username must be 3-25 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
}

/// Chess.com usernames are letters, digits, underscores and hyphens.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message = Some("username may only contain letters, digits, '_' and '-'".into());
        Err(error)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub identity_id: IdentityId,
    pub username: String,
    pub outcome: UpsertOutcome,
    /// False when the identity was saved but the initial ratings were not.
    pub ratings_stored: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub identity_id: IdentityId,
    pub username: String,
    pub profile_url: String,
    pub ratings: RatingValues,
    /// Truncated mean of the available rapid, blitz and bullet ratings.
    pub average: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub identity_id: IdentityId,
    pub snapshot: RatingSnapshot,
}
