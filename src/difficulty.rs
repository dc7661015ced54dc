use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SessionError;

/// Tunable difficulty parameters a game can declare rules for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Param {
    /// Per-round answer budget in milliseconds
    RoundTimeMs,
    /// Pattern or sequence length
    DataSize,
    /// Number of distractor levels
    Distraction,
    /// Per-item display time in milliseconds
    DisplayTimeMs,
    /// Side length of a square grid
    GridSize,
}

/// How a rule moves its parameter on level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adjustment {
    Decrease { step: u64, floor: u64 },
    Increase { step: u64, cap: u64 },
}

/// A monotonic, bounded step applied to one parameter every `every_levels` levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRule {
    pub param: Param,
    pub initial: u64,
    pub adjustment: Adjustment,
    pub every_levels: u32,
}

impl DifficultyRule {
    pub fn decreasing(param: Param, initial: u64, step: u64, floor: u64) -> Self {
        Self {
            param,
            initial,
            adjustment: Adjustment::Decrease { step, floor },
            every_levels: 1,
        }
    }

    pub fn increasing(param: Param, initial: u64, step: u64, cap: u64) -> Self {
        Self {
            param,
            initial,
            adjustment: Adjustment::Increase { step, cap },
            every_levels: 1,
        }
    }

    /// Only apply on levels divisible by `levels`
    pub fn every(mut self, levels: u32) -> Self {
        self.every_levels = levels;
        self
    }

    /// The floor of a decreasing rule or the cap of an increasing one
    pub fn limit(&self) -> u64 {
        match self.adjustment {
            Adjustment::Decrease { floor, .. } => floor,
            Adjustment::Increase { cap, .. } => cap,
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.every_levels == 0 {
            return Err(SessionError::configuration(format!(
                "rule for {} has a zero level period",
                self.param
            )));
        }
        match self.adjustment {
            Adjustment::Decrease { step: 0, .. } | Adjustment::Increase { step: 0, .. } => {
                Err(SessionError::configuration(format!(
                    "rule for {} has a zero step",
                    self.param
                )))
            }
            Adjustment::Decrease { floor, .. } if floor > self.initial => {
                Err(SessionError::configuration(format!(
                    "floor {} of {} exceeds its initial value {}",
                    floor, self.param, self.initial
                )))
            }
            Adjustment::Increase { cap, .. } if cap < self.initial => {
                Err(SessionError::configuration(format!(
                    "cap {} of {} is below its initial value {}",
                    cap, self.param, self.initial
                )))
            }
            _ => Ok(()),
        }
    }

    /// The value after reaching `new_level`, starting from `current`
    pub fn apply(&self, current: u64, new_level: u32) -> u64 {
        if new_level % self.every_levels != 0 {
            return current;
        }
        match self.adjustment {
            Adjustment::Decrease { step, floor } => current.saturating_sub(step).max(floor),
            Adjustment::Increase { step, cap } => current.saturating_add(step).min(cap),
        }
    }
}

/// What has to happen for a level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelUpTrigger {
    /// `n` correct answers in a row
    Streak(u32),
    /// every `n` correct answers, mistakes in between allowed
    Cumulative(u32),
}

impl LevelUpTrigger {
    pub fn validate(&self) -> Result<(), SessionError> {
        match self {
            LevelUpTrigger::Streak(0) | LevelUpTrigger::Cumulative(0) => Err(
                SessionError::configuration("level-up threshold must be positive"),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub param: Param,
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub level: u32,
    pub changes: Vec<ParamChange>,
}

/// Level progression policy: uniform streak-based triggering, per-game effects
#[derive(Debug, Clone)]
pub struct DifficultyController {
    trigger: LevelUpTrigger,
    rules: Vec<DifficultyRule>,
    values: BTreeMap<Param, u64>,
    level: u32,
    consecutive_correct: u32,
    correct_since_level_up: u32,
}

impl DifficultyController {
    pub fn new(trigger: LevelUpTrigger, rules: Vec<DifficultyRule>) -> Result<Self, SessionError> {
        trigger.validate()?;
        let mut values = BTreeMap::new();
        for rule in &rules {
            rule.validate()?;
            if values.insert(rule.param, rule.initial).is_some() {
                return Err(SessionError::configuration(format!(
                    "more than one rule for {}",
                    rule.param
                )));
            }
        }

        Ok(Self {
            trigger,
            rules,
            values,
            level: 1,
            consecutive_correct: 0,
            correct_since_level_up: 0,
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    pub fn param(&self, param: Param) -> Option<u64> {
        self.values.get(&param).copied()
    }

    /// Feeds one round outcome in; returns the level-up it caused, if any.
    pub fn on_round_resolved(&mut self, correct: bool) -> Option<LevelUp> {
        if !correct {
            self.consecutive_correct = 0;
            return None;
        }

        self.consecutive_correct += 1;
        self.correct_since_level_up += 1;

        let due = match self.trigger {
            LevelUpTrigger::Streak(n) => self.consecutive_correct >= n,
            LevelUpTrigger::Cumulative(n) => self.correct_since_level_up >= n,
        };

        due.then(|| self.level_up())
    }

    pub fn level_up(&mut self) -> LevelUp {
        self.level += 1;
        self.consecutive_correct = 0;
        self.correct_since_level_up = 0;

        let mut changes = Vec::new();
        for rule in &self.rules {
            let current = self.values.get(&rule.param).copied().unwrap_or(rule.initial);
            let next = rule.apply(current, self.level);
            if next != current {
                self.values.insert(rule.param, next);
                changes.push(ParamChange {
                    param: rule.param,
                    from: current,
                    to: next,
                });
            }
        }

        debug!(level = self.level, ?changes, "level up");
        LevelUp {
            level: self.level,
            changes,
        }
    }

    /// Back to level 1 with every parameter at its initial value
    pub fn reset(&mut self) {
        self.level = 1;
        self.consecutive_correct = 0;
        self.correct_since_level_up = 0;
        self.values = self.rules.iter().map(|r| (r.param, r.initial)).collect();
    }
}
