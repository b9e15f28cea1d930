use serde::{Deserialize, Serialize};

/// Components that sum (before sticky dampening) to the points earned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsBreakdown {
    pub base_points: i32,
    /// What the performance multiplier added to (or took from) the base points
    pub performance_bonus: f64,
    pub mvp_bonus: i32,
    pub team_mvp_bonus: i32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdateResult {
    pub points_earned: i32,
    pub breakdown: PointsBreakdown,
    pub k_factor: f64,
    pub performance_multiplier: f64,
    pub sticky_multiplier: f64,
    /// Set when the fixed win/loss delta was used instead of the calculation
    pub fallback: bool
}
