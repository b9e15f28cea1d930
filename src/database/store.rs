//! Storage seams of the rank core. The manager only talks to these traits, so
//! settlement and sweeps run the same against Postgres and the in-memory store.

use thiserror::Error;

use super::db_structs::{CompletedMatch, MatchStatLine, RankHistoryEntry, RankUpdate, RatingProfile};
use crate::model::structures::game::Game;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("row has unknown game id {0}")]
    UnknownGame(i32),
    #[error("store unavailable: {0}")]
    Unavailable(String)
}

pub trait PlayerStore {
    async fn get_profile(&self, player_id: i64, game: Game) -> Result<Option<RatingProfile>, StoreError>;

    /// Returns `false` when a profile already exists for the player and game.
    async fn create_profile(&self, profile: &RatingProfile) -> Result<bool, StoreError>;

    /// Returns `false` when no profile was updated.
    async fn update_rank(&self, update: &RankUpdate) -> Result<bool, StoreError>;

    /// Highest MMR first, ties broken by lowest player id.
    async fn top_profiles(&self, game: Game, limit: usize) -> Result<Vec<RatingProfile>, StoreError>;

    async fn profiles_with_ranks(&self, game: Game, labels: &[String]) -> Result<Vec<RatingProfile>, StoreError>;
}

pub trait MatchFeed {
    async fn match_stats(&self, match_id: i64) -> Result<Vec<MatchStatLine>, StoreError>;

    /// Completed, unsettled matches, oldest first.
    async fn pending_matches(&self, game: Option<Game>) -> Result<Vec<CompletedMatch>, StoreError>;

    /// `false` for unknown matches.
    async fn is_match_settled(&self, match_id: i64) -> Result<bool, StoreError>;

    async fn mark_settled(&self, match_id: i64) -> Result<(), StoreError>;
}

pub trait HistoryLog {
    async fn append(&self, entry: &RankHistoryEntry) -> Result<(), StoreError>;
}
