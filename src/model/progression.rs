use serde::Serialize;

use crate::model::rank_table::RankTable;

/// Where a player sits inside their band and how far the next one is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankProgression {
    pub current_rank: String,
    pub current_mmr: i32,
    pub next_rank: Option<String>,
    pub next_rank_mmr: i32,
    pub progress_to_next_pct: u8,
    pub mmr_needed: i32
}

/// Progress is measured against the band that contains the MMR, not the held
/// label, so an elite holder that slipped keeps seeing an honest distance.
pub fn progression(table: &RankTable, current_rank: &str, current_mmr: i32) -> RankProgression {
    let band = table
        .band_for_mmr(current_mmr)
        .unwrap_or_else(|| table.bottom_band());

    let Some(next) = table.next_band(band) else {
        return RankProgression {
            current_rank: current_rank.to_string(),
            current_mmr,
            next_rank: None,
            next_rank_mmr: current_mmr,
            progress_to_next_pct: 100,
            mmr_needed: 0
        };
    };

    let width = (band.max_mmr - band.min_mmr) as f64;
    let pct = if width > 0.0 {
        (100.0 * (current_mmr - band.min_mmr) as f64 / width).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    RankProgression {
        current_rank: current_rank.to_string(),
        current_mmr,
        next_rank: Some(next.name.clone()),
        next_rank_mmr: next.min_mmr,
        progress_to_next_pct: pct,
        mmr_needed: (next.min_mmr - current_mmr).max(0)
    }
}
