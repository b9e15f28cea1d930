use std::path::Path;

use itertools::Itertools;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn open_ended() -> i32 {
    i32::MAX
}

/// A contiguous MMR range mapped to a rank label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBand {
    pub name: String,
    pub min_mmr: i32,
    /// Inclusive. Omitted in configuration for the open-ended top band.
    #[serde(default = "open_ended")]
    pub max_mmr: i32,
    pub ordinal: i32,
    /// Elite bands are held only by the top N players by MMR.
    /// The band's `min_mmr` is the MMR floor for holding it.
    #[serde(default)]
    pub elite_window: Option<u32>
}

impl RankBand {
    pub fn contains(&self, mmr: i32) -> bool {
        mmr >= self.min_mmr && mmr <= self.max_mmr
    }

    pub fn is_elite(&self) -> bool {
        self.elite_window.is_some()
    }
}

#[derive(Debug, Error)]
pub enum RankTableError {
    #[error("rank table has no bands")]
    Empty,
    #[error("lowest band '{0}' must start at 0 MMR")]
    DoesNotStartAtZero(String),
    #[error("band '{0}' has min_mmr above max_mmr")]
    Inverted(String),
    #[error("band '{next}' does not start directly after '{prev}'")]
    NotContiguous { prev: String, next: String },
    #[error("band ordinals must increase ('{0}')")]
    OrdinalOrder(String),
    #[error("duplicate band name '{0}'")]
    DuplicateName(String),
    #[error("elite band '{0}' sits below a standard band")]
    EliteBelowStandard(String),
    #[error("elite window of '{0}' must be smaller than the band below it")]
    EliteWindowOrder(String),
    #[error("top band '{0}' must be open-ended")]
    BoundedTop(String),
    #[error("failed to read rank table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rank table: {0}")]
    Parse(#[from] serde_json::Error)
}

/// The authoritative MMR → rank mapping, lowest band first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankTable {
    bands: Vec<RankBand>
}

lazy_static! {
    static ref DEFAULT_BANDS: Vec<RankBand> = vec![
        band("Iron", 0, 299, 1, None),
        band("Bronze", 300, 599, 2, None),
        band("Silver", 600, 899, 3, None),
        band("Gold", 900, 1199, 4, None),
        band("Platinum", 1200, 1499, 5, None),
        band("Diamond", 1500, 1799, 6, None),
        band("Ascendant", 1800, 2099, 7, None),
        band("Immortal", 2100, 2499, 8, None),
        band("Master", 2500, 2899, 9, None),
        band("Grandmaster", 2900, 3199, 10, Some(20)),
        band("Apex", 3200, i32::MAX, 11, Some(10)),
    ];
}

fn band(name: &str, min_mmr: i32, max_mmr: i32, ordinal: i32, elite_window: Option<u32>) -> RankBand {
    RankBand {
        name: name.to_string(),
        min_mmr,
        max_mmr,
        ordinal,
        elite_window
    }
}

impl Default for RankTable {
    fn default() -> Self {
        RankTable {
            bands: DEFAULT_BANDS.clone()
        }
    }
}

impl RankTable {
    /// Validates and wraps a set of bands. Bands may be given in any order.
    pub fn new(mut bands: Vec<RankBand>) -> Result<RankTable, RankTableError> {
        bands.sort_by_key(|b| b.min_mmr);

        let first = bands.first().ok_or(RankTableError::Empty)?;
        if first.min_mmr != 0 {
            return Err(RankTableError::DoesNotStartAtZero(first.name.clone()));
        }

        if let Some(dup) = bands.iter().map(|b| b.name.to_ascii_lowercase()).duplicates().next() {
            return Err(RankTableError::DuplicateName(dup));
        }

        for b in &bands {
            if b.min_mmr > b.max_mmr {
                return Err(RankTableError::Inverted(b.name.clone()));
            }
        }

        for pair in bands.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);

            if prev.max_mmr.checked_add(1) != Some(next.min_mmr) {
                return Err(RankTableError::NotContiguous {
                    prev: prev.name.clone(),
                    next: next.name.clone()
                });
            }
            if next.ordinal <= prev.ordinal {
                return Err(RankTableError::OrdinalOrder(next.name.clone()));
            }
            if prev.is_elite() && !next.is_elite() {
                return Err(RankTableError::EliteBelowStandard(prev.name.clone()));
            }
            if let (Some(lower), Some(upper)) = (prev.elite_window, next.elite_window) {
                if upper >= lower {
                    return Err(RankTableError::EliteWindowOrder(next.name.clone()));
                }
            }
        }

        if bands.iter().all(|b| b.is_elite()) {
            return Err(RankTableError::EliteBelowStandard(bands[0].name.clone()));
        }

        if let Some(top) = bands.last().filter(|b| b.max_mmr != i32::MAX) {
            return Err(RankTableError::BoundedTop(top.name.clone()));
        }

        Ok(RankTable { bands })
    }

    /// Loads bands from a JSON array.
    pub fn from_json_file(path: &Path) -> Result<RankTable, RankTableError> {
        let contents = std::fs::read_to_string(path)?;
        let bands: Vec<RankBand> = serde_json::from_str(&contents)?;

        RankTable::new(bands)
    }

    pub fn all_bands(&self) -> &[RankBand] {
        &self.bands
    }

    /// The band whose range contains `mmr`, elite bands included.
    pub fn band_for_mmr(&self, mmr: i32) -> Option<&RankBand> {
        self.bands.iter().find(|b| b.contains(mmr))
    }

    /// The band a player holds on MMR alone. Elite bands are never returned;
    /// MMR above the highest standard band resolves to that band.
    pub fn standard_band_for_mmr(&self, mmr: i32) -> &RankBand {
        let top_standard = self.top_standard_band();

        match self.band_for_mmr(mmr) {
            Some(b) if !b.is_elite() => b,
            Some(_) => top_standard,
            None => self.bottom_band()
        }
    }

    pub fn band_by_name(&self, name: &str) -> Option<&RankBand> {
        self.bands.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// The band directly above `band`, if any.
    pub fn next_band(&self, band: &RankBand) -> Option<&RankBand> {
        self.bands
            .iter()
            .position(|b| b.name == band.name)
            .and_then(|i| self.bands.get(i + 1))
    }

    pub fn bottom_band(&self) -> &RankBand {
        &self.bands[0]
    }

    pub fn top_band(&self) -> &RankBand {
        &self.bands[self.bands.len() - 1]
    }

    /// Elite bands ordered from the smallest window (the scarcest) outward.
    pub fn elite_bands(&self) -> Vec<&RankBand> {
        let mut elite: Vec<&RankBand> = self.bands.iter().filter(|b| b.is_elite()).collect();
        elite.sort_by_key(|b| b.elite_window);
        elite
    }

    pub fn is_elite_label(&self, label: &str) -> bool {
        self.band_by_name(label).is_some_and(|b| b.is_elite())
    }

    fn top_standard_band(&self) -> &RankBand {
        self.bands
            .iter()
            .rev()
            .find(|b| !b.is_elite())
            .unwrap_or(&self.bands[0])
    }
}
