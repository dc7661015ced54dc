use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::difficulty::{DifficultyController, Param};

/// Remaining and total time the speed bonus is measured against, plus how
/// long the session has been running when the answer came in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub remaining: Duration,
    pub total: Duration,
    pub session_elapsed: Duration,
}

impl TimeWindow {
    pub fn new(remaining: Duration, total: Duration) -> Self {
        Self {
            remaining: remaining.min(total),
            total,
            session_elapsed: Duration::ZERO,
        }
    }

    pub fn with_session_elapsed(mut self, elapsed: Duration) -> Self {
        self.session_elapsed = elapsed;
        self
    }

    pub fn expired(total: Duration) -> Self {
        Self::new(Duration::ZERO, total)
    }

    /// Remaining share of the window in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.total.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Speed bonus curve; the exact shape is per-game data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBonus {
    None,
    /// `max(1, floor(fraction * scale))`
    Fraction { scale: u64 },
    /// `max(1, floor(remaining_ms / per_point))`
    RemainingMillis { per_point: u64 },
    /// `max(1, start - floor(session_elapsed_secs / secs_per_point))`
    ElapsedDecay { start: u64, secs_per_point: u64 },
}

impl TimeBonus {
    pub fn points(&self, window: TimeWindow) -> u64 {
        match *self {
            TimeBonus::None => 0,
            TimeBonus::Fraction { scale } => {
                ((window.fraction() * scale as f64).floor() as u64).max(1)
            }
            TimeBonus::RemainingMillis { per_point } => {
                let ms = window.remaining.as_millis() as u64;
                (ms / per_point.max(1)).max(1)
            }
            TimeBonus::ElapsedDecay {
                start,
                secs_per_point,
            } => {
                let decay = window.session_elapsed.as_secs() / secs_per_point.max(1);
                start.saturating_sub(decay).max(1)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasePoints {
    Fixed(u64),
    /// `points` per unit of a difficulty parameter (cells to remember, digits)
    PerParam { param: Param, points: u64 },
}

impl BasePoints {
    pub fn resolve(&self, difficulty: &DifficultyController) -> u64 {
        match *self {
            BasePoints::Fixed(points) => points,
            BasePoints::PerParam { param, points } => {
                difficulty.param(param).unwrap_or(0).saturating_mul(points)
            }
        }
    }
}

/// Fixed base + speed bonus + level bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFormula {
    pub base: BasePoints,
    pub time_bonus: TimeBonus,
    pub level_multiplier: u64,
}

impl Default for RewardFormula {
    fn default() -> Self {
        Self {
            base: BasePoints::Fixed(10),
            time_bonus: TimeBonus::None,
            level_multiplier: 0,
        }
    }
}

impl RewardFormula {
    /// Points for a correct answer. `base_override` replaces the configured
    /// base when the round itself dictates it (e.g. word length).
    pub fn reward(
        &self,
        level: u32,
        window: TimeWindow,
        difficulty: &DifficultyController,
        base_override: Option<u64>,
    ) -> u64 {
        let base = base_override.unwrap_or_else(|| self.base.resolve(difficulty));
        compute_reward(level, self.time_bonus.points(window), base, self.level_multiplier)
    }
}

pub fn compute_reward(level: u32, time_bonus: u64, base_points: u64, level_multiplier: u64) -> u64 {
    base_points
        .saturating_add(time_bonus)
        .saturating_add(u64::from(level).saturating_mul(level_multiplier))
}

/// Percentage of correct answers, rounded; 0 before any answer
pub fn compute_accuracy(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}
