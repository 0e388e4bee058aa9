use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::IdentityId;
use crate::dto::ranking::Category;

/// Ratings for every tracked category. Any of them may be missing when the
/// player never played that time control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RatingValues {
    pub rapid: Option<i32>,
    pub blitz: Option<i32>,
    pub bullet: Option<i32>,
    pub puzzle: Option<i32>,
    pub puzzle_rush: Option<i32>,
}

impl RatingValues {
    /// Stored value for a concrete category. `Overall` has no stored value.
    pub fn get(&self, category: Category) -> Option<i32> {
        match category {
            Category::Rapid => self.rapid,
            Category::Blitz => self.blitz,
            Category::Bullet => self.bullet,
            Category::Puzzle => self.puzzle,
            Category::PuzzleRush => self.puzzle_rush,
            Category::Overall => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rapid.is_none()
            && self.blitz.is_none()
            && self.bullet.is_none()
            && self.puzzle.is_none()
            && self.puzzle_rush.is_none()
    }
}

/// One stored rating record. Only the most recent per identity is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RatingSnapshot {
    pub snapshot_id: i64,
    pub identity_id: IdentityId,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub values: RatingValues,
    pub updated_at: DateTime<Utc>,
}

/// An identity joined with its latest snapshot; the input to ranking.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SnapshotRow {
    pub identity_id: IdentityId,
    pub account_name: String,
    #[sqlx(flatten)]
    pub values: RatingValues,
    pub updated_at: DateTime<Utc>,
}
