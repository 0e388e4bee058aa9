use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::dto::common::{PAGE_SIZE, total_pages};
use storage::dto::ranking::{Category, RankedEntry};
use utoipa::ToSchema;

use super::view::{Controls, controls};

pub const THUMBNAIL_URL: &str = "https://cdn-icons-png.flaticon.com/512/5987/5987898.png";

/// A ranked category as of one point in time. Sessions page through the
/// copy they were opened with.
#[derive(Debug, Clone)]
pub struct LeaderboardData {
    pub category: Category,
    pub entries: Vec<RankedEntry>,
    pub last_updated: DateTime<Utc>,
}

impl LeaderboardData {
    pub fn total_pages(&self) -> usize {
        total_pages(self.entries.len(), PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PagePayload {
    pub title: String,
    pub description: Option<String>,
    pub rows: Vec<PageRow>,
    pub footer: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RenderedPage {
    pub page: usize,
    pub total_pages: usize,
    pub payload: PagePayload,
    pub controls: Option<Controls>,
}

/// Render page `page` (1-based) of `data`, controls included.
pub fn render(page: usize, data: &LeaderboardData) -> RenderedPage {
    let total = data.total_pages();
    let start = ((page.max(1) - 1) * PAGE_SIZE).min(data.entries.len());
    let end = (start + PAGE_SIZE).min(data.entries.len());

    let (title, description) = heading(data.category);
    let rows = data.entries[start..end]
        .iter()
        .map(|entry| PageRow {
            label: format!("{} {}", medal(entry.rank), entry.display_name),
            value: row_value(data.category, entry),
        })
        .collect();

    RenderedPage {
        page,
        total_pages: total,
        payload: PagePayload {
            title,
            description,
            rows,
            footer: format!(
                "Page {}/{} • Last updated • {}",
                page,
                total,
                data.last_updated.format("%Y-%m-%d")
            ),
            thumbnail_url: Some(THUMBNAIL_URL.to_string()),
        },
        controls: controls(page, total),
    }
}

fn heading(category: Category) -> (String, Option<String>) {
    match category {
        Category::Overall => (
            "Overall Chess.com Ratings Leaderboard".to_string(),
            Some("Average of all available ratings".to_string()),
        ),
        Category::PuzzleRush => (
            "Chess.com Puzzle Rush Leaderboard".to_string(),
            Some("Top puzzle rush survival scores".to_string()),
        ),
        other => (format!("Chess.com {} Ratings Leaderboard", other.label()), None),
    }
}

fn medal(rank: i64) -> String {
    match rank {
        1 => "🏆".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{}.", n),
    }
}

fn row_value(category: Category, entry: &RankedEntry) -> String {
    match category {
        Category::Overall => {
            let part = |v: Option<i32>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
            format!(
                "Average: **{}**\nRapid: {} | Blitz: {} | Bullet: {}",
                entry.score as i64,
                part(entry.values.rapid),
                part(entry.values.blitz),
                part(entry.values.bullet)
            )
        }
        Category::PuzzleRush => format!("Score: **{}**", entry.score as i64),
        _ => format!("Rating: **{}**", entry.score as i64),
    }
}
