use serde::Deserialize;
use storage::models::RatingValues;

/// `GET /pub/player/{username}/stats`. Every section is missing for players
/// who never played that mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerStats {
    pub chess_rapid: Option<GameModeStats>,
    pub chess_blitz: Option<GameModeStats>,
    pub chess_bullet: Option<GameModeStats>,
    pub tactics: Option<TacticsStats>,
    pub puzzle_rush: Option<PuzzleRushStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameModeStats {
    pub last: Option<RatingPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TacticsStats {
    pub highest: Option<RatingPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleRushStats {
    pub best: Option<PuzzleRushScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingPoint {
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleRushScore {
    pub score: Option<i32>,
}

/// `GET /pub/player/{username}`. Only used to confirm the account exists.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerProfile {
    pub username: Option<String>,
    pub url: Option<String>,
}

fn last_rating(mode: &Option<GameModeStats>) -> Option<i32> {
    mode.as_ref()?.last.as_ref()?.rating
}

impl From<&PlayerStats> for RatingValues {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            rapid: last_rating(&stats.chess_rapid),
            blitz: last_rating(&stats.chess_blitz),
            bullet: last_rating(&stats.chess_bullet),
            puzzle: stats
                .tactics
                .as_ref()
                .and_then(|t| t.highest.as_ref())
                .and_then(|h| h.rating),
            puzzle_rush: stats
                .puzzle_rush
                .as_ref()
                .and_then(|p| p.best.as_ref())
                .and_then(|b| b.score),
        }
    }
}
