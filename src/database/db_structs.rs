use crate::model::structures::{game::Game, match_outcome::MatchOutcomeInput, rank_change_reason::RankChangeReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player's standing on one game's ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingProfile {
    pub player_id: i64,
    pub game: Game,
    pub current_mmr: i32,
    /// Never lowered
    pub peak_mmr: i32,
    pub rank_label: String,
    pub rank_value: i32
}

/// A rank/MMR write. The store raises `peak_mmr` to `mmr` when it is higher.
#[derive(Debug, Clone, PartialEq)]
pub struct RankUpdate {
    pub player_id: i64,
    pub game: Game,
    pub rank_label: String,
    pub rank_value: i32,
    pub mmr: i32
}

/// Immutable audit record of a rank label change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankHistoryEntry {
    pub player_id: i64,
    pub game: Game,
    pub old_rank: String,
    pub new_rank: String,
    pub old_mmr: i32,
    pub new_mmr: i32,
    pub reason: RankChangeReason,
    pub match_id: Option<i64>,
    pub timestamp: DateTime<Utc>
}

/// One player's stats in a completed match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStatLine {
    pub match_id: i64,
    pub player_id: i64,
    pub game: Game,
    pub outcome: MatchOutcomeInput
}

/// A match that has completed but has not been settled yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedMatch {
    pub id: i64,
    pub game: Game,
    pub completed_at: DateTime<Utc>
}
