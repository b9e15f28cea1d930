use serde::{Deserialize, Serialize};

use crate::model::{
    constants::{
        CONFIDENCE_BOOST, CONFIDENCE_HIGH_BOOST, CONFIDENCE_HIGH_WIN_RATE, CONFIDENCE_MIN_GAMES, CONFIDENCE_WIN_RATE,
        PEAK_BOOST_MAX, PEAK_BOOST_PER_TIER, PLACEMENT_ELO_CEILING
    },
    rank_table::RankTable,
    structures::game::Game
};

/// Career numbers from the source game, used to nudge a placement upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub wins: u32,
    pub games_played: u32,
    pub peak_rank: Option<String>
}

/// What a player reports about their standing in the source game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub source_rank: String,
    pub source_elo: f64,
    #[serde(default)]
    pub lifetime: Option<LifetimeStats>
}

/// MMR sub-ranges for each placement step. Every source rank maps to one
/// step; ranks at or above a game's high threshold share the last step.
const PLACEMENT_RANGES: [(i32, i32); 7] = [(0, 40), (30, 70), (60, 110), (100, 150), (140, 190), (180, 230), (220, 280)];

/// Maps a source-game rank name to a placement step.
///
/// Names are matched on their tier only: `"Gold 2"`, `"gold ii"` and `"GOLD"`
/// are the same step. Unknown names land on the lowest step.
pub fn placement_step(game: Game, source_rank: &str) -> usize {
    let tier = normalize_tier(source_rank);

    let step = match game {
        Game::Valorant => match tier.as_str() {
            "unranked" | "unrated" | "iron" => 0,
            "bronze" => 1,
            "silver" => 2,
            "gold" => 3,
            "platinum" => 4,
            "diamond" => 5,
            "ascendant" | "immortal" | "radiant" => 6,
            _ => 0
        },
        Game::MarvelRivals => match tier.as_str() {
            "unranked" | "bronze" => 0,
            "silver" => 1,
            "gold" => 2,
            "platinum" => 3,
            "diamond" => 4,
            "grandmaster" => 5,
            "celestial" | "eternity" | "one above all" => 6,
            _ => 0
        }
    };

    step.min(PLACEMENT_RANGES.len() - 1)
}

/// # Initial placement
///
/// Places a new player inside the bottom band of the ladder, whatever their
/// standing in the source game.
///
/// 1. The source rank picks a `{min, max}` sub-range.
/// 2. The source ELO (0..5000) interpolates within that range.
/// 3. A confidence boost is added for a strong win rate, and for a lifetime
///    peak above the current source rank.
/// 4. The result is clamped to the bottom band's ceiling.
pub fn initial_mmr(
    table: &RankTable,
    game: Game,
    source_rank: &str,
    source_elo: f64,
    lifetime: Option<&LifetimeStats>
) -> i32 {
    let step = placement_step(game, source_rank);
    let (min, max) = PLACEMENT_RANGES[step];

    let elo = if source_elo.is_finite() {
        source_elo.clamp(0.0, PLACEMENT_ELO_CEILING)
    } else {
        0.0
    };
    let normalized = elo / PLACEMENT_ELO_CEILING;
    let base = min + ((max - min) as f64 * normalized).round() as i32;

    let boost = lifetime.map_or(0, |stats| confidence_boost(game, step, stats));
    let ceiling = table.bottom_band().max_mmr;

    (base + boost).clamp(0, ceiling)
}

fn confidence_boost(game: Game, current_step: usize, stats: &LifetimeStats) -> i32 {
    let mut boost = 0;

    if stats.games_played > 0 {
        let win_rate = stats.wins as f64 / stats.games_played as f64;

        if win_rate > CONFIDENCE_HIGH_WIN_RATE && stats.games_played > CONFIDENCE_MIN_GAMES {
            boost += CONFIDENCE_HIGH_BOOST;
        } else if win_rate > CONFIDENCE_WIN_RATE {
            boost += CONFIDENCE_BOOST;
        }
    }

    if let Some(peak) = stats.peak_rank.as_deref() {
        let peak_step = placement_step(game, peak);
        if peak_step > current_step {
            let steps_above = (peak_step - current_step) as i32;
            boost += (steps_above * PEAK_BOOST_PER_TIER).min(PEAK_BOOST_MAX);
        }
    }

    boost
}

/// Lowercases and strips a trailing division (`2`, `II`) from a rank name.
fn normalize_tier(source_rank: &str) -> String {
    let mut words: Vec<String> = source_rank
        .split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect();

    if let Some(last) = words.last() {
        let is_division = last.chars().all(|c| c.is_ascii_digit()) || matches!(last.as_str(), "i" | "ii" | "iii");
        if is_division && words.len() > 1 {
            words.pop();
        }
    }

    words.join(" ")
}
