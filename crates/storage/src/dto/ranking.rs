use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{IdentityId, RatingValues};

/// Leaderboard categories. `Overall` is derived at read time from the
/// stored time-control ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Rapid,
    Blitz,
    Bullet,
    Puzzle,
    PuzzleRush,
    #[default]
    Overall,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Rapid,
        Self::Blitz,
        Self::Bullet,
        Self::Puzzle,
        Self::PuzzleRush,
        Self::Overall,
    ];

    /// Categories averaged into `Overall`.
    pub const OVERALL_COMPONENTS: [Category; 3] = [Self::Rapid, Self::Blitz, Self::Bullet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rapid => "rapid",
            Self::Blitz => "blitz",
            Self::Bullet => "bullet",
            Self::Puzzle => "puzzle",
            Self::PuzzleRush => "puzzle_rush",
            Self::Overall => "overall",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rapid => "Rapid",
            Self::Blitz => "Blitz",
            Self::Bullet => "Bullet",
            Self::Puzzle => "Puzzle",
            Self::PuzzleRush => "Puzzle Rush",
            Self::Overall => "Overall",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown category: '{}'. Available: {}",
                    s,
                    Self::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedEntry {
    pub rank: i64,
    pub identity_id: IdentityId,
    pub display_name: String,
    pub values: RatingValues,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!("rapid".parse::<Category>().unwrap(), Category::Rapid);
        assert_eq!("Puzzle Rush".parse::<Category>().unwrap(), Category::PuzzleRush);
        assert_eq!("puzzle-rush".parse::<Category>().unwrap(), Category::PuzzleRush);
        assert_eq!("OVERALL".parse::<Category>().unwrap(), Category::Overall);
        assert!("classical".parse::<Category>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }
}
