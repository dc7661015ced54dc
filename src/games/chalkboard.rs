use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use crate::round::{Challenge, RoundContext, RoundGenerator};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "×")]
    Multiply,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];

    fn apply(&self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equation {
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
}

impl Equation {
    pub fn solve(&self) -> i64 {
        self.op.apply(self.lhs, self.rhs)
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} = ?", self.lhs, self.op, self.rhs)
    }
}

/// Largest left and right operands per level
pub fn operand_limits(level: u32) -> (i64, i64) {
    match level {
        0 | 1 => (10, 10),
        2 => (20, 10),
        3 => (20, 20),
        4 => (50, 20),
        _ => (100, 50),
    }
}

/// Mental arithmetic
#[derive(Debug)]
pub struct Chalkboard {
    rng: StdRng,
}

impl Default for Chalkboard {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Chalkboard {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RoundGenerator for Chalkboard {
    type Prompt = Equation;
    type Answer = i64;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Equation, i64> {
        let (max_lhs, max_rhs) = operand_limits(ctx.level);
        let ops = if ctx.level <= 2 {
            &Operator::ALL[..2]
        } else {
            &Operator::ALL[..]
        };
        let op = *ops.choose(&mut self.rng).unwrap_or(&Operator::Add);

        let mut lhs = self.rng.gen_range(1..=max_lhs);
        let mut rhs = self.rng.gen_range(1..=max_rhs);
        if op == Operator::Subtract && rhs > lhs {
            std::mem::swap(&mut lhs, &mut rhs);
        }

        let equation = Equation { lhs, op, rhs };
        Challenge::new(equation, equation.solve())
    }
}

impl Game for Chalkboard {
    fn kind(&self) -> GameKind {
        GameKind::Chalkboard
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(1500),
            round_time: Some(Param::RoundTimeMs),
            reward: RewardFormula {
                base: BasePoints::Fixed(10),
                time_bonus: TimeBonus::RemainingMillis { per_point: 500 },
                level_multiplier: 5,
            },
            trigger: LevelUpTrigger::Streak(3),
            rules: vec![DifficultyRule::decreasing(Param::RoundTimeMs, 10_000, 1000, 3000)],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<i64> {
        input.parse().ok()
    }

    fn answer_hint(&self) -> &'static str {
        "type the result as a whole number"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyController;

    fn rounds(level: u32, n: u32) -> Vec<Equation> {
        let mut game = Chalkboard::with_rng(StdRng::seed_from_u64(u64::from(level)));
        let dc = DifficultyController::new(LevelUpTrigger::Streak(3), vec![]).unwrap();
        (0..n)
            .map(|index| {
                game.next_round(&RoundContext {
                    index,
                    level,
                    difficulty: &dc,
                })
                .prompt
            })
            .collect()
    }

    #[test]
    fn test_early_levels_only_add_and_subtract() {
        for eq in rounds(1, 200).into_iter().chain(rounds(2, 200)) {
            assert_ne!(eq.op, Operator::Multiply);
        }
        assert!(rounds(3, 200).iter().any(|eq| eq.op == Operator::Multiply));
    }

    #[test]
    fn test_subtraction_never_goes_negative() {
        for level in 1..=6 {
            for eq in rounds(level, 200) {
                assert!(eq.solve() >= 0, "{eq}");
            }
        }
    }

    #[test]
    fn test_operands_stay_within_level_limits() {
        for level in 1..=6 {
            let (max_lhs, max_rhs) = operand_limits(level);
            let max = max_lhs.max(max_rhs);
            for eq in rounds(level, 200) {
                assert!((1..=max).contains(&eq.lhs));
                assert!((1..=max).contains(&eq.rhs));
            }
        }
    }

    #[test]
    fn test_renders_and_parses() {
        let eq = Equation {
            lhs: 7,
            op: Operator::Multiply,
            rhs: 6,
        };
        assert_eq!(eq.to_string(), "7 × 6 = ?");
        assert_eq!(eq.solve(), 42);

        let game = Chalkboard::default();
        assert_eq!(game.parse_answer("42"), Some(42));
        assert_eq!(game.parse_answer("-3"), Some(-3));
        assert_eq!(game.parse_answer("4 2"), None);
    }
}
