use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    database::{
        db_structs::{MatchStatLine, RankHistoryEntry, RankUpdate, RatingProfile},
        store::{HistoryLog, MatchFeed, PlayerStore, StoreError}
    },
    model::{
        constants::UNRANKED_LABEL,
        elite::{leaderboard_size, plan_sweep, settled_rank, RankAssignment},
        placement::{initial_mmr, PlacementRequest},
        progression::{progression, RankProgression},
        rank_table::RankTable,
        rating_engine::compute_delta,
        structures::{game::Game, rank_change_reason::RankChangeReason},
        usage::{UsageLimitExceeded, UsageTracker}
    },
    utils::progress_utils::progress_bar
};

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("match {0} has no player stats")]
    NoStats(i64),
    #[error("match {0} was already settled")]
    AlreadySettled(i64),
    #[error("no {game} profile for player {player_id}")]
    PlayerNotFound { player_id: i64, game: Game },
    #[error("rank update for player {0} was not applied")]
    UpdateRejected(i64),
    #[error("no player in match {match_id} could be settled ({attempted} attempted)")]
    NothingSettled { match_id: i64, attempted: usize }
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Limited(#[from] UsageLimitExceeded),
    #[error(transparent)]
    Store(#[from] StoreError)
}

/// One player's result from a settled match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChange {
    pub player_id: i64,
    pub game: Game,
    pub match_id: i64,
    pub old_mmr: i32,
    pub new_mmr: i32,
    pub old_rank: String,
    pub new_rank: String,
    pub rank_changed: bool,
    pub points_earned: i32,
    pub fallback: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    pub game: Game,
    /// Leaders and current elite holders looked at
    pub examined: usize,
    pub promoted: usize,
    pub demoted: usize,
    pub failed: usize,
    /// Changes that were written
    pub applied: Vec<RankAssignment>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementReport {
    pub settled: Vec<i64>,
    pub failed: Vec<i64>,
    pub changes: Vec<RankChange>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub profile: RatingProfile,
    pub already_placed: bool
}

/// Applies match results, placements and elite sweeps to a rank store.
///
/// All rating math lives in pure functions; the manager reads the inputs from
/// the store, runs them, and writes the results back with history records.
pub struct RankManager<S> {
    store: S,
    table: RankTable
}

impl<S> RankManager<S>
where
    S: PlayerStore + MatchFeed + HistoryLog
{
    pub fn new(store: S, table: RankTable) -> RankManager<S> {
        RankManager { store, table }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn table(&self) -> &RankTable {
        &self.table
    }

    /// # Match settlement
    ///
    /// Applies a completed match to every participant.
    ///
    /// Steps:
    /// 1. Refuse a match that was already settled, then load its stat lines.
    /// 2. For each player, compute the delta from their current MMR and floor
    ///    the result at 0.
    /// 3. Resolve the new label. A held elite label is kept while the MMR stays
    ///    above its floor; otherwise the standard band for the new MMR.
    /// 4. Persist MMR, label and peak, then record a history entry if the
    ///    label moved.
    /// 5. Mark the match settled so no later run applies it again.
    ///
    /// A player that cannot be settled is logged and skipped. The match only
    /// fails as a whole when there is nothing to settle or nobody was settled.
    pub async fn settle_match(&self, match_id: i64) -> Result<Vec<RankChange>, SettlementError> {
        if self.store.is_match_settled(match_id).await? {
            return Err(SettlementError::AlreadySettled(match_id));
        }

        let lines = self.store.match_stats(match_id).await?;
        if lines.is_empty() {
            return Err(SettlementError::NoStats(match_id));
        }

        let mut changes = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.settle_player(line).await {
                Ok(change) => changes.push(change),
                Err(e) => warn!("Match {}: skipping player {}: {}", match_id, line.player_id, e)
            }
        }

        if changes.is_empty() {
            return Err(SettlementError::NothingSettled {
                match_id,
                attempted: lines.len()
            });
        }

        if let Err(e) = self.store.mark_settled(match_id).await {
            error!("Match {} was applied but could not be marked settled: {}", match_id, e);
        }

        info!(
            "Settled match {}: {}/{} players, {} rank change(s)",
            match_id,
            changes.len(),
            lines.len(),
            changes.iter().filter(|c| c.rank_changed).count()
        );

        Ok(changes)
    }

    async fn settle_player(&self, line: &MatchStatLine) -> Result<RankChange, SettlementError> {
        let profile = self
            .store
            .get_profile(line.player_id, line.game)
            .await?
            .ok_or(SettlementError::PlayerNotFound {
                player_id: line.player_id,
                game: line.game
            })?;

        let result = compute_delta(&line.outcome, profile.current_mmr);
        let new_mmr = profile.current_mmr.saturating_add(result.points_earned).max(0);
        let band = settled_rank(&self.table, &profile.rank_label, new_mmr);

        let update = RankUpdate {
            player_id: profile.player_id,
            game: profile.game,
            rank_label: band.name.clone(),
            rank_value: band.ordinal,
            mmr: new_mmr
        };

        if !self.store.update_rank(&update).await? {
            return Err(SettlementError::UpdateRejected(profile.player_id));
        }

        let rank_changed = !band.name.eq_ignore_ascii_case(&profile.rank_label);
        if rank_changed {
            self.record(RankHistoryEntry {
                player_id: profile.player_id,
                game: profile.game,
                old_rank: profile.rank_label.clone(),
                new_rank: band.name.clone(),
                old_mmr: profile.current_mmr,
                new_mmr,
                reason: RankChangeReason::Match,
                match_id: Some(line.match_id),
                timestamp: Utc::now()
            })
            .await;
        }

        debug!(
            "Player {} ({}): {} -> {} MMR ({:+})",
            profile.player_id, profile.game, profile.current_mmr, new_mmr, result.points_earned
        );

        Ok(RankChange {
            player_id: profile.player_id,
            game: profile.game,
            match_id: line.match_id,
            old_mmr: profile.current_mmr,
            new_mmr,
            old_rank: profile.rank_label,
            new_rank: band.name.clone(),
            rank_changed,
            points_earned: result.points_earned,
            fallback: result.fallback
        })
    }

    /// Settles every completed, unsettled match, oldest first. Matches that
    /// fail are left pending for the next run.
    pub async fn settle_pending(&self, game: Option<Game>) -> Result<SettlementReport, StoreError> {
        let pending = self.store.pending_matches(game).await?;
        let bar = progress_bar(pending.len() as u64, "Settling matches".to_string());
        let mut report = SettlementReport::default();

        for completed in &pending {
            match self.settle_match(completed.id).await {
                Ok(changes) => {
                    report.settled.push(completed.id);
                    report.changes.extend(changes);
                }
                Err(e) => {
                    warn!("Match {} left pending: {}", completed.id, e);
                    report.failed.push(completed.id);
                }
            }

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        info!(
            "Settled {} match(es), {} left pending",
            report.settled.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// # Elite sweep
    ///
    /// Recomputes the elite labels of one game from the current leaderboard
    /// and writes only the labels that changed. Running it twice in a row
    /// writes nothing the second time.
    pub async fn sweep_elite_ranks(&self, game: Game) -> Result<SweepSummary, StoreError> {
        let leaders = self
            .store
            .top_profiles(game, leaderboard_size(&self.table))
            .await?;
        let elite_labels: Vec<String> = self
            .table
            .elite_bands()
            .iter()
            .map(|b| b.name.clone())
            .collect();
        let holders = self.store.profiles_with_ranks(game, &elite_labels).await?;

        let plan = plan_sweep(&self.table, &leaders, &holders);
        let examined = leaders
            .iter()
            .chain(holders.iter())
            .map(|p| p.player_id)
            .collect::<HashSet<_>>()
            .len();

        let mut summary = SweepSummary {
            game,
            examined,
            promoted: 0,
            demoted: 0,
            failed: 0,
            applied: Vec::with_capacity(plan.len())
        };

        for assignment in plan {
            let update = RankUpdate {
                player_id: assignment.player_id,
                game,
                rank_label: assignment.new_rank.clone(),
                rank_value: assignment.rank_value,
                mmr: assignment.mmr
            };

            match self.store.update_rank(&update).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Sweep: no {} profile for player {}", game, assignment.player_id);
                    summary.failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Sweep: failed to update player {}: {}", assignment.player_id, e);
                    summary.failed += 1;
                    continue;
                }
            }

            self.record(RankHistoryEntry {
                player_id: assignment.player_id,
                game,
                old_rank: assignment.old_rank.clone(),
                new_rank: assignment.new_rank.clone(),
                old_mmr: assignment.mmr,
                new_mmr: assignment.mmr,
                reason: RankChangeReason::EliteSweep,
                match_id: None,
                timestamp: Utc::now()
            })
            .await;

            if assignment.promotion {
                summary.promoted += 1;
            } else {
                summary.demoted += 1;
            }
            summary.applied.push(assignment);
        }

        info!(
            "Elite sweep for {}: {} examined, {} promoted, {} demoted, {} failed",
            game, summary.examined, summary.promoted, summary.demoted, summary.failed
        );

        Ok(summary)
    }

    /// `None` when the player has no profile for `game`.
    pub async fn progression_for(&self, player_id: i64, game: Game) -> Result<Option<RankProgression>, StoreError> {
        let profile = self.store.get_profile(player_id, game).await?;

        Ok(profile.map(|p| progression(&self.table, &p.rank_label, p.current_mmr)))
    }

    /// Creates a profile in the bottom band from the player's source-game
    /// standing. An existing profile is returned untouched.
    pub async fn place_player(
        &self,
        player_id: i64,
        game: Game,
        request: &PlacementRequest
    ) -> Result<Placement, StoreError> {
        if let Some(existing) = self.store.get_profile(player_id, game).await? {
            return Ok(Placement {
                profile: existing,
                already_placed: true
            });
        }

        let mmr = initial_mmr(
            &self.table,
            game,
            &request.source_rank,
            request.source_elo,
            request.lifetime.as_ref()
        );
        let band = self.table.standard_band_for_mmr(mmr);
        let profile = RatingProfile {
            player_id,
            game,
            current_mmr: mmr,
            peak_mmr: mmr,
            rank_label: band.name.clone(),
            rank_value: band.ordinal
        };

        if !self.store.create_profile(&profile).await? {
            // Placed concurrently; report what is stored now
            let stored = self.store.get_profile(player_id, game).await?.unwrap_or(profile);
            return Ok(Placement {
                profile: stored,
                already_placed: true
            });
        }

        self.record(RankHistoryEntry {
            player_id,
            game,
            old_rank: UNRANKED_LABEL.to_string(),
            new_rank: band.name.clone(),
            old_mmr: 0,
            new_mmr: mmr,
            reason: RankChangeReason::Placement,
            match_id: None,
            timestamp: Utc::now()
        })
        .await;

        info!(
            "Placed player {} in {} at {} MMR ({} from '{}')",
            player_id, band.name, mmr, game, request.source_rank
        );

        Ok(Placement {
            profile,
            already_placed: false
        })
    }

    /// [`RankManager::place_player`] behind a per-user daily limit.
    pub async fn place_player_limited(
        &self,
        usage: &mut UsageTracker,
        now: DateTime<Utc>,
        player_id: i64,
        game: Game,
        request: &PlacementRequest
    ) -> Result<Placement, PlacementError> {
        let remaining = usage.check_and_record(player_id, now)?;
        debug!("Player {} has {} placement request(s) left today", player_id, remaining);

        Ok(self.place_player(player_id, game, request).await?)
    }

    /// Forces a label and MMR, bypassing the rating engine.
    /// Returns `false` for unknown labels, missing profiles and store failures.
    pub async fn set_rank(&self, player_id: i64, game: Game, label: &str, mmr: i32) -> bool {
        let Some(band) = self.table.band_by_name(label) else {
            warn!("Manual rank: unknown label '{}'", label);
            return false;
        };

        let profile = match self.store.get_profile(player_id, game).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!("Manual rank: no {} profile for player {}", game, player_id);
                return false;
            }
            Err(e) => {
                warn!("Manual rank: failed to load player {}: {}", player_id, e);
                return false;
            }
        };

        let mmr = mmr.max(0);
        let update = RankUpdate {
            player_id,
            game,
            rank_label: band.name.clone(),
            rank_value: band.ordinal,
            mmr
        };

        match self.store.update_rank(&update).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!("Manual rank: failed to update player {}: {}", player_id, e);
                return false;
            }
        }

        self.record(RankHistoryEntry {
            player_id,
            game,
            old_rank: profile.rank_label,
            new_rank: band.name.clone(),
            old_mmr: profile.current_mmr,
            new_mmr: mmr,
            reason: RankChangeReason::Manual,
            match_id: None,
            timestamp: Utc::now()
        })
        .await;

        true
    }

    /// History is an audit trail; a failed append never undoes the rank write.
    async fn record(&self, entry: RankHistoryEntry) {
        if let Err(e) = self.store.append(&entry).await {
            error!(
                "Failed to record rank history for player {} ({} -> {}): {}",
                entry.player_id, entry.old_rank, entry.new_rank, e
            );
        }
    }
}
