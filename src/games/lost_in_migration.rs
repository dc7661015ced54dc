use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use crate::round::{Challenge, ProgressContext, RoundContext, RoundGenerator};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

const MAX_FLANKERS: usize = 8;
const MAX_DISTRACTION: u64 = 4;
/// From this level most flankers point away from the leader
const CONFLICT_LEVEL: u32 = 3;
const CONFLICT_CHANCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Direction {
    #[strum(serialize = "↑")]
    Up,
    #[strum(serialize = "→")]
    Right,
    #[strum(serialize = "↓")]
    Down,
    #[strum(serialize = "←")]
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    fn parse(input: &str) -> Option<Direction> {
        match input.to_lowercase().as_str() {
            "u" | "up" | "↑" | "w" | "k" => Some(Direction::Up),
            "r" | "right" | "→" | "d" | "l" => Some(Direction::Right),
            "down" | "↓" | "s" | "j" => Some(Direction::Down),
            "left" | "←" | "a" | "h" => Some(Direction::Left),
            _ => None,
        }
    }
}

/// The leader surrounded by flankers, half on each side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flock {
    pub leader: Direction,
    pub flankers: Vec<Direction>,
}

impl fmt::Display for Flock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.flankers.split_at(self.flankers.len() / 2);
        for d in left {
            write!(f, "{d} ")?;
        }
        write!(f, "[{}]", self.leader)?;
        for d in right {
            write!(f, " {d}")?;
        }
        Ok(())
    }
}

/// Flanker task: report the middle bird's heading
#[derive(Debug)]
pub struct LostInMigration {
    rng: StdRng,
}

impl Default for LostInMigration {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl LostInMigration {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    fn flanker(&mut self, leader: Direction, level: u32) -> Direction {
        if level >= CONFLICT_LEVEL && self.rng.gen_bool(CONFLICT_CHANCE) {
            let others: Vec<Direction> =
                Direction::ALL.into_iter().filter(|&d| d != leader).collect();
            *others.choose(&mut self.rng).unwrap_or(&leader)
        } else {
            *Direction::ALL.choose(&mut self.rng).unwrap_or(&leader)
        }
    }
}

pub fn flanker_count(distraction: u64) -> usize {
    usize::try_from(distraction.saturating_mul(2))
        .unwrap_or(MAX_FLANKERS)
        .min(MAX_FLANKERS)
}

impl RoundGenerator for LostInMigration {
    type Prompt = Flock;
    type Answer = Direction;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Flock, Direction> {
        let leader = *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::Up);
        let count = flanker_count(ctx.param_or(Param::Distraction, 0));
        let flankers = (0..count).map(|_| self.flanker(leader, ctx.level)).collect();
        Challenge::new(Flock { leader, flankers }, leader)
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        let distraction = ctx.difficulty.param(Param::Distraction).unwrap_or(0);
        format!(
            "{}% accuracy - Distraction {}/{}",
            ctx.accuracy,
            distraction + 1,
            MAX_DISTRACTION + 1
        )
    }
}

impl Game for LostInMigration {
    fn kind(&self) -> GameKind {
        GameKind::LostInMigration
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(1000),
            round_time: Some(Param::RoundTimeMs),
            reward: RewardFormula {
                base: BasePoints::Fixed(10),
                time_bonus: TimeBonus::None,
                level_multiplier: 2,
            },
            trigger: LevelUpTrigger::Streak(5),
            rules: vec![
                DifficultyRule::decreasing(Param::RoundTimeMs, 2000, 200, 800),
                DifficultyRule::increasing(Param::Distraction, 0, 1, MAX_DISTRACTION).every(2),
            ],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Direction> {
        Direction::parse(input)
    }

    fn answer_hint(&self) -> &'static str {
        "heading of the middle bird: up/right/down/left, wasd or hjkl"
    }
}
