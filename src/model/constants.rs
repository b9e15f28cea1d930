// Rating engine constants

/// Lower MMR bound of each K-factor / sticky tier, lowest first.
pub const TIER_FLOORS: [i32; 5] = [0, 1400, 2000, 2600, 3000];
pub const K_FACTORS: [f64; 5] = [36.0, 32.0, 27.0, 22.0, 18.0];
pub const STICKY_GAIN: [f64; 5] = [1.0, 0.95, 0.9, 0.85, 0.8];
pub const STICKY_LOSS: [f64; 5] = [1.0, 0.975, 0.95, 0.925, 0.9];

pub const DEFAULT_EXPECTED_SCORE: f64 = 0.5;

/// (minimum K/D, multiplier on a win, multiplier on a loss), best band first.
pub const PERFORMANCE_BANDS: [(f64, f64, f64); 5] = [
    (2.0, 1.3, 0.9),
    (1.5, 1.2, 0.95),
    (1.0, 1.1, 1.0),
    (0.5, 0.95, 1.1),
    (0.0, 0.8, 1.2)
];

pub const MVP_WIN_BONUS: i32 = 5;
pub const MVP_LOSS_BONUS: i32 = 3;
pub const TEAM_MVP_WIN_BONUS: i32 = 2;

pub const FALLBACK_WIN_POINTS: i32 = 15;
pub const FALLBACK_LOSS_POINTS: i32 = -8;

// Initial placement
pub const PLACEMENT_ELO_CEILING: f64 = 5000.0;
pub const CONFIDENCE_MIN_GAMES: u32 = 10;
pub const CONFIDENCE_HIGH_WIN_RATE: f64 = 0.6;
pub const CONFIDENCE_HIGH_BOOST: i32 = 50;
pub const CONFIDENCE_WIN_RATE: f64 = 0.5;
pub const CONFIDENCE_BOOST: i32 = 25;
pub const PEAK_BOOST_PER_TIER: i32 = 15;
pub const PEAK_BOOST_MAX: i32 = 30;


// Placement requests allowed per user per UTC day
pub const DAILY_PLACEMENT_LIMIT: u32 = 3;

pub const UNRANKED_LABEL: &str = "Unranked";
