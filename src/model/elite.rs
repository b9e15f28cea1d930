use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    database::db_structs::RatingProfile,
    model::{
        rank_table::{RankBand, RankTable},
        structures::game::Game
    }
};

/// A label change decided by an elite sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RankAssignment {
    pub player_id: i64,
    pub game: Game,
    pub old_rank: String,
    pub new_rank: String,
    pub rank_value: i32,
    pub mmr: i32,
    pub promotion: bool
}

/// How many leaders a sweep needs to look at: the widest elite window.
pub fn leaderboard_size(table: &RankTable) -> usize {
    table
        .elite_bands()
        .iter()
        .filter_map(|b| b.elite_window)
        .max()
        .unwrap_or(0) as usize
}

/// The rank a player holds after a match moves them to `new_mmr`.
///
/// Elite labels are only handed out by sweeps, so a match never promotes into
/// one. A held elite label survives the match while the new MMR stays at or
/// above that band's floor; the next sweep re-checks the population window.
pub fn settled_rank<'a>(table: &'a RankTable, held_label: &str, new_mmr: i32) -> &'a RankBand {
    match table.band_by_name(held_label) {
        Some(held) if held.is_elite() && new_mmr >= held.min_mmr => held,
        _ => table.standard_band_for_mmr(new_mmr)
    }
}

/// # Elite sweep
///
/// Re-derives the elite labels for one game from scratch.
///
/// - `leaders` are the top players by MMR (at least as many as the widest
///   elite window). Position `n` qualifies for the scarcest elite band whose
///   window includes `n` and whose floor the player's MMR meets.
/// - `holders` are the players currently carrying any elite label. Holders
///   that no longer qualify drop to their standard band.
///
/// Only real label changes are returned, so planning against the result of a
/// previous sweep yields nothing.
pub fn plan_sweep(table: &RankTable, leaders: &[RatingProfile], holders: &[RatingProfile]) -> Vec<RankAssignment> {
    let elite = table.elite_bands();
    if elite.is_empty() {
        return Vec::new();
    }

    let ranked: Vec<&RatingProfile> = leaders
        .iter()
        .sorted_by(|a, b| b.current_mmr.cmp(&a.current_mmr).then(a.player_id.cmp(&b.player_id)))
        .collect();

    // Qualifying leaders in leaderboard order
    let mut targets: IndexMap<i64, &RankBand> = IndexMap::new();
    for (i, profile) in ranked.iter().enumerate() {
        let position = (i + 1) as u32;
        let qualifying = elite.iter().find(|band| {
            band.elite_window.is_some_and(|window| position <= window) && profile.current_mmr >= band.min_mmr
        });

        if let Some(band) = qualifying {
            targets.insert(profile.player_id, band);
        }
    }

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();

    for profile in ranked.iter().copied().chain(holders.iter()) {
        if !seen.insert(profile.player_id) {
            continue;
        }

        let target = match targets.get(&profile.player_id) {
            Some(band) => *band,
            None if table.is_elite_label(&profile.rank_label) => table.standard_band_for_mmr(profile.current_mmr),
            None => continue
        };

        if target.name.eq_ignore_ascii_case(&profile.rank_label) {
            continue;
        }

        let promotion = table
            .band_by_name(&profile.rank_label)
            .map_or(true, |old| target.ordinal > old.ordinal);

        assignments.push(RankAssignment {
            player_id: profile.player_id,
            game: profile.game,
            old_rank: profile.rank_label.clone(),
            new_rank: target.name.clone(),
            rank_value: target.ordinal,
            mmr: profile.current_mmr,
            promotion
        });
    }

    assignments
}
