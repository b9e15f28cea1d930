// In-process store used by tests and dry runs.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError}
};

use itertools::Itertools;

use super::{
    db_structs::{CompletedMatch, MatchStatLine, RankHistoryEntry, RankUpdate, RatingProfile},
    store::{HistoryLog, MatchFeed, PlayerStore, StoreError}
};
use crate::model::structures::game::Game;

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<(i64, Game), RatingProfile>,
    matches: HashMap<i64, CompletedMatch>,
    stats: HashMap<i64, Vec<MatchStatLine>>,
    settled: HashSet<i64>,
    history: Vec<RankHistoryEntry>,
    failing_players: HashSet<i64>,
    writes: usize
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_profile(&self, profile: RatingProfile) {
        self.state()
            .profiles
            .insert((profile.player_id, profile.game), profile);
    }

    pub fn insert_match(&self, completed: CompletedMatch, lines: Vec<MatchStatLine>) {
        let mut state = self.state();
        state.stats.insert(completed.id, lines);
        state.matches.insert(completed.id, completed);
    }

    pub fn profile(&self, player_id: i64, game: Game) -> Option<RatingProfile> {
        self.state().profiles.get(&(player_id, game)).cloned()
    }

    pub fn history(&self) -> Vec<RankHistoryEntry> {
        self.state().history.clone()
    }

    pub fn is_settled(&self, match_id: i64) -> bool {
        self.state().settled.contains(&match_id)
    }

    /// Number of successful rank writes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Makes every read and write for `player_id` fail, as a lost connection would.
    pub fn fail_player(&self, player_id: i64) {
        self.state().failing_players.insert(player_id);
    }

    fn check_player(state: &MemoryState, player_id: i64) -> Result<(), StoreError> {
        if state.failing_players.contains(&player_id) {
            Err(StoreError::Unavailable(format!("player {}", player_id)))
        } else {
            Ok(())
        }
    }
}

impl PlayerStore for MemoryStore {
    async fn get_profile(&self, player_id: i64, game: Game) -> Result<Option<RatingProfile>, StoreError> {
        let state = self.state();
        Self::check_player(&state, player_id)?;

        Ok(state.profiles.get(&(player_id, game)).cloned())
    }

    async fn create_profile(&self, profile: &RatingProfile) -> Result<bool, StoreError> {
        let mut state = self.state();
        Self::check_player(&state, profile.player_id)?;

        let key = (profile.player_id, profile.game);
        if state.profiles.contains_key(&key) {
            return Ok(false);
        }

        let mut stored = profile.clone();
        stored.peak_mmr = stored.peak_mmr.max(stored.current_mmr);
        state.profiles.insert(key, stored);
        Ok(true)
    }

    async fn update_rank(&self, update: &RankUpdate) -> Result<bool, StoreError> {
        let mut state = self.state();
        Self::check_player(&state, update.player_id)?;

        let Some(profile) = state.profiles.get_mut(&(update.player_id, update.game)) else {
            return Ok(false);
        };

        profile.current_mmr = update.mmr;
        profile.peak_mmr = profile.peak_mmr.max(update.mmr);
        profile.rank_label = update.rank_label.clone();
        profile.rank_value = update.rank_value;
        state.writes += 1;

        Ok(true)
    }

    async fn top_profiles(&self, game: Game, limit: usize) -> Result<Vec<RatingProfile>, StoreError> {
        Ok(self
            .state()
            .profiles
            .values()
            .filter(|p| p.game == game)
            .sorted_by(|a, b| b.current_mmr.cmp(&a.current_mmr).then(a.player_id.cmp(&b.player_id)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn profiles_with_ranks(&self, game: Game, labels: &[String]) -> Result<Vec<RatingProfile>, StoreError> {
        Ok(self
            .state()
            .profiles
            .values()
            .filter(|p| p.game == game && labels.contains(&p.rank_label))
            .sorted_by(|a, b| b.current_mmr.cmp(&a.current_mmr).then(a.player_id.cmp(&b.player_id)))
            .cloned()
            .collect())
    }
}

impl MatchFeed for MemoryStore {
    async fn match_stats(&self, match_id: i64) -> Result<Vec<MatchStatLine>, StoreError> {
        Ok(self.state().stats.get(&match_id).cloned().unwrap_or_default())
    }

    async fn pending_matches(&self, game: Option<Game>) -> Result<Vec<CompletedMatch>, StoreError> {
        let state = self.state();

        Ok(state
            .matches
            .values()
            .filter(|m| !state.settled.contains(&m.id))
            .filter(|m| game.map_or(true, |g| m.game == g))
            .sorted_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.cmp(&b.id)))
            .cloned()
            .collect())
    }

    async fn is_match_settled(&self, match_id: i64) -> Result<bool, StoreError> {
        Ok(self.is_settled(match_id))
    }

    async fn mark_settled(&self, match_id: i64) -> Result<(), StoreError> {
        self.state().settled.insert(match_id);
        Ok(())
    }
}

impl HistoryLog for MemoryStore {
    async fn append(&self, entry: &RankHistoryEntry) -> Result<(), StoreError> {
        self.state().history.push(entry.clone());
        Ok(())
    }
}
