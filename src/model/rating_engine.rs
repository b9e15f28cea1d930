use thiserror::Error;
use tracing::warn;

use crate::model::{
    constants::{
        FALLBACK_LOSS_POINTS, FALLBACK_WIN_POINTS, K_FACTORS, MVP_LOSS_BONUS, MVP_WIN_BONUS, PERFORMANCE_BANDS,
        STICKY_GAIN, STICKY_LOSS, TEAM_MVP_WIN_BONUS, TIER_FLOORS
    },
    structures::{
        match_outcome::MatchOutcomeInput,
        rating_update_result::{PointsBreakdown, RatingUpdateResult}
    }
};

#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("rating calculation produced a non-finite value ({stage}): {value}")]
    NonFinite { stage: &'static str, value: f64 },
    #[error("rating delta {0} does not fit in an i32")]
    OutOfRange(f64)
}

/// # Match delta
///
/// Converts one player's match outcome into a signed MMR change.
///
/// Steps:
/// 1. Elo-style base: `round(K × (actual − expected))`, where K shrinks as the
///    player's current MMR climbs through the tiers.
/// 2. The base is scaled by a K/D performance multiplier. Good games inflate a
///    win and soften a loss; poor games do the opposite.
/// 3. Flat MVP / team MVP bonuses are added after the multiplier.
/// 4. The total is scaled by the sticky multiplier, which compresses movement
///    at the top of the ladder.
///
/// Never fails: if the calculation cannot produce a finite result, the fixed
/// fallback delta is returned with `fallback` set.
pub fn compute_delta(input: &MatchOutcomeInput, current_mmr: i32) -> RatingUpdateResult {
    match try_compute_delta(input, current_mmr) {
        Ok(result) => result,
        Err(e) => {
            warn!("Rating calculation failed ({}), using fallback delta", e);
            fallback_result(input.won)
        }
    }
}

/// The calculation behind [`compute_delta`], without the fallback.
pub fn try_compute_delta(input: &MatchOutcomeInput, current_mmr: i32) -> Result<RatingUpdateResult, RatingError> {
    let k = k_factor(current_mmr);
    let actual = if input.won { 1.0 } else { 0.0 };
    let raw_base = k * (actual - input.expected_score());
    let base_points = finite("base", raw_base)?.round() as i32;

    let performance_multiplier = performance_multiplier(input.won, input.kill_death_ratio());
    let scaled_base = finite("performance", base_points as f64 * performance_multiplier)?;

    let mvp_bonus = match (input.is_mvp, input.won) {
        (true, true) => MVP_WIN_BONUS,
        (true, false) => MVP_LOSS_BONUS,
        (false, _) => 0
    };
    let team_mvp_bonus = if input.is_team_mvp && input.won {
        TEAM_MVP_WIN_BONUS
    } else {
        0
    };

    let total = scaled_base + mvp_bonus as f64 + team_mvp_bonus as f64;
    let sticky_multiplier = sticky_multiplier(current_mmr, total >= 0.0);
    let points = finite("sticky", total * sticky_multiplier)?.round();

    if points > i32::MAX as f64 || points < i32::MIN as f64 {
        return Err(RatingError::OutOfRange(points));
    }

    Ok(RatingUpdateResult {
        points_earned: points as i32,
        breakdown: PointsBreakdown {
            base_points,
            performance_bonus: scaled_base - base_points as f64,
            mvp_bonus,
            team_mvp_bonus
        },
        k_factor: k,
        performance_multiplier,
        sticky_multiplier,
        fallback: false
    })
}

/// The fixed delta used when the calculation cannot complete.
pub fn fallback_result(won: bool) -> RatingUpdateResult {
    let points = if won {
        FALLBACK_WIN_POINTS
    } else {
        FALLBACK_LOSS_POINTS
    };

    RatingUpdateResult {
        points_earned: points,
        breakdown: PointsBreakdown {
            base_points: points,
            ..Default::default()
        },
        k_factor: 0.0,
        performance_multiplier: 1.0,
        sticky_multiplier: 1.0,
        fallback: true
    }
}

pub fn k_factor(current_mmr: i32) -> f64 {
    K_FACTORS[tier_index(current_mmr)]
}

/// Scales the Elo component by K/D. The loss scale is inverted and
/// compressed relative to the win scale.
pub fn performance_multiplier(won: bool, kill_death_ratio: f64) -> f64 {
    let kd = if kill_death_ratio.is_finite() {
        kill_death_ratio
    } else {
        0.0
    };

    let (_, on_win, on_loss) = PERFORMANCE_BANDS
        .iter()
        .find(|(min_kd, _, _)| kd >= *min_kd)
        .copied()
        .unwrap_or(PERFORMANCE_BANDS[PERFORMANCE_BANDS.len() - 1]);

    if won {
        on_win
    } else {
        on_loss
    }
}

pub fn sticky_multiplier(current_mmr: i32, gain: bool) -> f64 {
    let tier = tier_index(current_mmr);
    if gain {
        STICKY_GAIN[tier]
    } else {
        STICKY_LOSS[tier]
    }
}

fn tier_index(current_mmr: i32) -> usize {
    TIER_FLOORS
        .iter()
        .rposition(|floor| current_mmr >= *floor)
        .unwrap_or(0)
}

fn finite(stage: &'static str, value: f64) -> Result<f64, RatingError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RatingError::NonFinite { stage, value })
    }
}
