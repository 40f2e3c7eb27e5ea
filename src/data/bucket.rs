//! Games-Played Bucketing
//! Classifies a player's games-played count into one of five fixed ranges.

use serde::{Serialize, Serializer};
use std::fmt;

/// Categorical label derived from the games-played count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GamesPlayedBucket {
    /// 1 to 3 games
    VeryLow,
    /// 4 to 5 games
    Low,
    /// 6 to 9 games
    Medium,
    /// 10 to 68 games
    High,
    /// Anything outside 1..=68, including missing counts
    Unknown,
}

impl GamesPlayedBucket {
    /// All labels in display order.
    pub const ALL: [GamesPlayedBucket; 5] = [
        GamesPlayedBucket::VeryLow,
        GamesPlayedBucket::Low,
        GamesPlayedBucket::Medium,
        GamesPlayedBucket::High,
        GamesPlayedBucket::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GamesPlayedBucket::VeryLow => "Very Low",
            GamesPlayedBucket::Low => "Low",
            GamesPlayedBucket::Medium => "Medium",
            GamesPlayedBucket::High => "High",
            GamesPlayedBucket::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GamesPlayedBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GamesPlayedBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Map a games-played count to its bucket. Total over `i64`.
pub fn bucket(games_played: i64) -> GamesPlayedBucket {
    match games_played {
        1..=3 => GamesPlayedBucket::VeryLow,
        4..=5 => GamesPlayedBucket::Low,
        6..=9 => GamesPlayedBucket::Medium,
        10..=68 => GamesPlayedBucket::High,
        _ => GamesPlayedBucket::Unknown,
    }
}

/// Same as [`bucket`], with a missing count falling through to `Unknown`.
pub fn bucket_optional(games_played: Option<i64>) -> GamesPlayedBucket {
    games_played.map_or(GamesPlayedBucket::Unknown, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        let cases = [
            (1, GamesPlayedBucket::VeryLow),
            (3, GamesPlayedBucket::VeryLow),
            (4, GamesPlayedBucket::Low),
            (5, GamesPlayedBucket::Low),
            (6, GamesPlayedBucket::Medium),
            (9, GamesPlayedBucket::Medium),
            (10, GamesPlayedBucket::High),
            (68, GamesPlayedBucket::High),
            (69, GamesPlayedBucket::Unknown),
            (0, GamesPlayedBucket::Unknown),
            (-5, GamesPlayedBucket::Unknown),
        ];
        for (games, expected) in cases {
            assert_eq!(bucket(games), expected, "bucket({})", games);
        }
    }

    #[test]
    fn test_bucket_extremes_are_unknown() {
        assert_eq!(bucket(i64::MIN), GamesPlayedBucket::Unknown);
        assert_eq!(bucket(i64::MAX), GamesPlayedBucket::Unknown);
        assert_eq!(bucket_optional(None), GamesPlayedBucket::Unknown);
        assert_eq!(bucket_optional(Some(7)), GamesPlayedBucket::Medium);
    }

    #[test]
    fn test_every_count_maps_to_one_known_label() {
        for games in -100..200 {
            let label = bucket(games);
            assert!(GamesPlayedBucket::ALL.contains(&label));
        }
    }

    #[test]
    fn test_labels_match_source_strings() {
        let labels: Vec<&str> = GamesPlayedBucket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(labels, ["Very Low", "Low", "Medium", "High", "Unknown"]);
        assert_eq!(
            serde_json::to_string(&GamesPlayedBucket::VeryLow).unwrap(),
            "\"Very Low\""
        );
    }
}
