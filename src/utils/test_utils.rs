use crate::{
    database::db_structs::{CompletedMatch, MatchStatLine, RatingProfile},
    model::{
        rank_table::RankTable,
        structures::{game::Game, match_outcome::MatchOutcomeInput}
    }
};
use chrono::{Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn generate_outcome(won: bool, kills: u32, deaths: u32, is_mvp: bool) -> MatchOutcomeInput {
    MatchOutcomeInput {
        won,
        kills,
        deaths,
        assists: 0,
        is_mvp,
        is_team_mvp: false,
        expected_score: None
    }
}

pub fn generate_profile(player_id: i64, game: Game, mmr: i32, rank_label: &str) -> RatingProfile {
    let table = RankTable::default();
    let rank_value = table.band_by_name(rank_label).map_or(0, |b| b.ordinal);

    RatingProfile {
        player_id,
        game,
        current_mmr: mmr,
        peak_mmr: mmr,
        rank_label: rank_label.to_string(),
        rank_value
    }
}

/// `n` players with ids `1..=n`, random MMR in `0..4500` and the standard
/// label for that MMR. Deterministic for a given seed.
pub fn generate_population(game: Game, n: usize, seed: u64) -> Vec<RatingProfile> {
    let table = RankTable::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (1..=n as i64)
        .map(|player_id| {
            let mmr = rng.random_range(0..4500);
            let band = table.standard_band_for_mmr(mmr);

            RatingProfile {
                player_id,
                game,
                current_mmr: mmr,
                peak_mmr: mmr + rng.random_range(0..200),
                rank_label: band.name.clone(),
                rank_value: band.ordinal
            }
        })
        .collect()
}

/// Random but plausible outcomes, one per player, half of them wins.
pub fn generate_outcomes(n: usize, seed: u64) -> Vec<MatchOutcomeInput> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..n)
        .map(|i| MatchOutcomeInput {
            won: i % 2 == 0,
            kills: rng.random_range(0..35),
            deaths: rng.random_range(0..25),
            assists: rng.random_range(0..15),
            is_mvp: rng.random_bool(0.1),
            is_team_mvp: rng.random_bool(0.2),
            expected_score: Some(rng.random_range(0.2..0.8))
        })
        .collect()
}

/// A completed match with one stat line per `(player_id, outcome)`.
/// Completion times increase with the match id.
pub fn generate_match(
    match_id: i64,
    game: Game,
    players: &[(i64, MatchOutcomeInput)]
) -> (CompletedMatch, Vec<MatchStatLine>) {
    let epoch = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let completed = CompletedMatch {
        id: match_id,
        game,
        completed_at: epoch + Duration::minutes(match_id)
    };

    let lines = players
        .iter()
        .map(|(player_id, outcome)| MatchStatLine {
            match_id,
            player_id: *player_id,
            game,
            outcome: outcome.clone()
        })
        .collect();

    (completed, lines)
}
