use std::cmp::Ordering;

use crate::dto::ranking::{Category, RankedEntry};
use crate::models::{RatingValues, SnapshotRow};

/// Mean of the available rapid, blitz and bullet ratings.
/// `None` when none of them are present.
pub fn overall_score(values: &RatingValues) -> Option<f64> {
    let present: Vec<f64> = Category::OVERALL_COMPONENTS
        .iter()
        .filter_map(|c| values.get(*c))
        .map(f64::from)
        .collect();

    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Rank the latest snapshot of every identity for `category`.
///
/// Concrete categories drop identities without a value. `Overall` keeps
/// everyone, scoring identities with no contributing rating at 0. Ties keep
/// input order.
pub fn rank(category: Category, rows: &[SnapshotRow]) -> Vec<RankedEntry> {
    let mut scored: Vec<(&SnapshotRow, f64)> = rows
        .iter()
        .filter_map(|row| match category {
            Category::Overall => Some((row, overall_score(&row.values).unwrap_or(0.0))),
            concrete => row.values.get(concrete).map(|v| (row, f64::from(v))),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (row, score))| RankedEntry {
            rank: idx as i64 + 1,
            identity_id: row.identity_id,
            display_name: row.account_name.clone(),
            values: row.values,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityId;
    use chrono::Utc;

    fn row(id: i64, name: &str, rapid: Option<i32>, blitz: Option<i32>, bullet: Option<i32>) -> SnapshotRow {
        SnapshotRow {
            identity_id: IdentityId(id),
            account_name: name.to_string(),
            values: RatingValues {
                rapid,
                blitz,
                bullet,
                puzzle: None,
                puzzle_rush: None,
            },
            updated_at: Utc::now(),
        }
    }

    fn names(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn test_rapid_and_blitz_rankings() {
        let rows = vec![
            row(1, "A", Some(1200), None, None),
            row(2, "B", Some(1000), Some(1100), None),
        ];

        let rapid = rank(Category::Rapid, &rows);
        assert_eq!(names(&rapid), vec!["A", "B"]);
        assert_eq!(rapid[0].score, 1200.0);
        assert_eq!(rapid[1].score, 1000.0);
        assert_eq!(rapid[1].rank, 2);

        let blitz = rank(Category::Blitz, &rows);
        assert_eq!(names(&blitz), vec!["B"]);
        assert_eq!(blitz[0].score, 1100.0);
    }

    #[test]
    fn test_overall_averages_present_values() {
        let rows = vec![
            row(1, "a", Some(1500), None, Some(1300)),
            row(2, "b", Some(1800), Some(1500), Some(1500)),
        ];

        let ranked = rank(Category::Overall, &rows);

        assert_eq!(names(&ranked), vec!["b", "a"]);
        assert_eq!(ranked[0].score, 1600.0);
        assert_eq!(ranked[1].score, 1400.0);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let rows = vec![
            row(1, "a", Some(1500), None, Some(1300)),
            row(2, "b", Some(1600), Some(1400), Some(1200)),
        ];
        // both average to 1400
        let ranked = rank(Category::Overall, &rows);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(names(&ranked), vec!["a", "b"]);
    }

    #[test]
    fn test_concrete_category_drops_missing_values() {
        let rows = vec![
            row(1, "a", Some(1500), None, Some(1300)),
            row(2, "b", Some(1600), Some(1400), Some(1200)),
        ];

        let ranked = rank(Category::Blitz, &rows);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].display_name, "b");
        assert_eq!(ranked[0].score, 1400.0);
    }

    #[test]
    fn test_overall_includes_identities_without_ratings_at_zero() {
        let rows = vec![
            row(1, "empty", None, None, None),
            row(2, "rated", Some(800), None, None),
            row(3, "also_empty", None, None, None),
        ];

        let ranked = rank(Category::Overall, &rows);

        assert_eq!(names(&ranked), vec!["rated", "empty", "also_empty"]);
        assert_eq!(ranked[1].score, 0.0);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_all_null_rows_give_empty_concrete_ranking() {
        let rows = vec![row(1, "a", None, None, None), row(2, "b", None, None, None)];
        assert!(rank(Category::Rapid, &rows).is_empty());
        assert_eq!(rank(Category::Overall, &rows).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        for category in Category::ALL {
            assert!(rank(category, &[]).is_empty());
        }
    }

    #[test]
    fn test_scores_are_non_increasing_and_ranks_contiguous() {
        let rows: Vec<SnapshotRow> = (0..40)
            .map(|i| row(i, &format!("p{i}"), Some(((i * 37) % 23) as i32 * 50 + 700), None, None))
            .collect();

        let ranked = rank(Category::Rapid, &rows);

        assert_eq!(ranked.len(), 40);
        for (idx, pair) in ranked.windows(2).enumerate() {
            assert!(pair[0].score >= pair[1].score);
            assert_eq!(pair[0].rank, idx as i64 + 1);
        }
    }

    #[test]
    fn test_puzzle_is_not_part_of_overall() {
        let values = RatingValues {
            rapid: Some(1000),
            puzzle: Some(3000),
            puzzle_rush: Some(40),
            ..Default::default()
        };
        assert_eq!(overall_score(&values), Some(1000.0));
        assert_eq!(overall_score(&RatingValues::default()), None);
    }
}
