//! Optimization scoring for generated route plans.
//!
//! The score combines two signals: how much of the scheduled time is spent on
//! activities rather than travel or idle gaps, and how evenly activity time is
//! spread across the days of the trip. The weighting is a tunable, not a
//! hidden constant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight for packing density (activity time vs travel + idle)
    pub packing_weight: f64,
    /// Weight for day-to-day balance of activity time
    pub balance_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            packing_weight: 60.0,
            balance_weight: 40.0,
        }
    }
}

impl ScoreWeights {
    /// Create weights from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            packing_weight: std::env::var("ROUTE_PACKING_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.packing_weight),
            balance_weight: std::env::var("ROUTE_BALANCE_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.balance_weight),
        }
    }
}

/// Per-day time accounting collected while laying out a plan. Buffer time is
/// planned logistics slack, not waste, so it is tracked apart from idle and
/// does not count against packing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayStats {
    pub activity_minutes: i64,
    pub travel_minutes: i64,
    pub idle_minutes: i64,
    pub buffer_minutes: i64,
}

/// Score in [0, 100]. A plan with no activity time scores 0. Packing more
/// activity time into less travel and idle time strictly increases the score,
/// all else equal; a perfectly packed, balanced plan scores 100.
pub fn optimization_score(days: &[DayStats], weights: &ScoreWeights) -> f64 {
    let activity: i64 = days.iter().map(|d| d.activity_minutes).sum();
    if activity == 0 || days.is_empty() {
        return 0.0;
    }

    let travel: i64 = days.iter().map(|d| d.travel_minutes).sum();
    let idle: i64 = days.iter().map(|d| d.idle_minutes).sum();
    let total = activity + travel + idle;
    let packing = activity as f64 / total as f64;

    let per_day: Vec<f64> = days.iter().map(|d| d.activity_minutes as f64).collect();
    let mean = per_day.iter().sum::<f64>() / per_day.len() as f64;
    let mean_abs_deviation =
        per_day.iter().map(|v| (v - mean).abs()).sum::<f64>() / per_day.len() as f64;
    let balance = (1.0 - mean_abs_deviation / mean).max(0.0);

    let weight_sum = weights.packing_weight + weights.balance_weight;
    if weight_sum <= 0.0 {
        return 0.0;
    }

    let score =
        100.0 * (weights.packing_weight * packing + weights.balance_weight * balance) / weight_sum;
    score.clamp(0.0, 100.0)
}
