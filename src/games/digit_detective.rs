use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use crate::round::{Challenge, ProgressContext, RoundContext, RoundGenerator};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

const INITIAL_LENGTH: u64 = 3;
const MAX_LENGTH: u64 = 12;
const INITIAL_DISPLAY_MS: u64 = 1000;
const PAUSE_BETWEEN_DIGITS_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub digits: Vec<u8>,
    /// Time each digit stays on screen
    pub display_ms: u64,
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digits.iter().join(" "))
    }
}

/// Digit span: repeat a sequence of digits after it disappears
#[derive(Debug)]
pub struct DigitDetective {
    rng: StdRng,
}

impl Default for DigitDetective {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl DigitDetective {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RoundGenerator for DigitDetective {
    type Prompt = Sequence;
    type Answer = Vec<u8>;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Sequence, Vec<u8>> {
        let length = ctx.param_or(Param::DataSize, INITIAL_LENGTH);
        let digits: Vec<u8> = (0..length).map(|_| self.rng.gen_range(1..=9)).collect();
        let display_ms = ctx.param_or(Param::DisplayTimeMs, INITIAL_DISPLAY_MS);
        Challenge::new(
            Sequence {
                digits: digits.clone(),
                display_ms,
            },
            digits,
        )
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        let length = ctx.difficulty.param(Param::DataSize).unwrap_or(INITIAL_LENGTH);
        format!("{length} digits - {}% accuracy", ctx.accuracy)
    }
}

impl Game for DigitDetective {
    fn kind(&self) -> GameKind {
        GameKind::DigitDetective
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(2000),
            round_time: None,
            reward: RewardFormula {
                base: BasePoints::PerParam {
                    param: Param::DataSize,
                    points: 10,
                },
                time_bonus: TimeBonus::None,
                level_multiplier: 0,
            },
            trigger: LevelUpTrigger::Streak(1),
            rules: vec![
                DifficultyRule::increasing(Param::DataSize, INITIAL_LENGTH, 1, MAX_LENGTH).every(2),
                DifficultyRule::decreasing(Param::DisplayTimeMs, INITIAL_DISPLAY_MS, 50, 500),
            ],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Vec<u8>> {
        let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            return None;
        }
        digits
            .chars()
            .map(|c| c.to_digit(10).and_then(|d| u8::try_from(d).ok()))
            .collect()
    }

    fn answer_hint(&self) -> &'static str {
        "type the digits in order, spaces optional"
    }

    /// The digits are shown one after another, then hidden
    fn reveal_time(&self, prompt: &Sequence) -> Option<Duration> {
        let per_digit = prompt.display_ms + PAUSE_BETWEEN_DIGITS_MS;
        Some(Duration::from_millis(per_digit * prompt.digits.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyController;

    fn controller() -> DifficultyController {
        let config = DigitDetective::default().session_config();
        DifficultyController::new(config.trigger, config.rules).unwrap()
    }

    #[test]
    fn test_sequence_length_follows_difficulty() {
        let mut game = DigitDetective::with_rng(StdRng::seed_from_u64(6));
        let mut dc = controller();

        let round = game.next_round(&RoundContext {
            index: 0,
            level: 1,
            difficulty: &dc,
        });
        assert_eq!(round.prompt.digits.len(), 3);
        assert!(round.prompt.digits.iter().all(|d| (1..=9).contains(d)));
        assert_eq!(round.expected, vec![round.prompt.digits.clone()]);

        dc.level_up();
        let round = game.next_round(&RoundContext {
            index: 1,
            level: 2,
            difficulty: &dc,
        });
        assert_eq!(round.prompt.digits.len(), 4);
        assert_eq!(round.prompt.display_ms, 950);
    }

    #[test]
    fn test_length_is_capped_and_display_time_floored() {
        let mut dc = controller();
        for _ in 0..40 {
            dc.level_up();
        }
        assert_eq!(dc.param(Param::DataSize), Some(MAX_LENGTH));
        assert_eq!(dc.param(Param::DisplayTimeMs), Some(500));
    }

    #[test]
    fn test_parses_digits_with_or_without_spaces() {
        let game = DigitDetective::default();
        assert_eq!(game.parse_answer("3 1 4"), Some(vec![3, 1, 4]));
        assert_eq!(game.parse_answer("314"), Some(vec![3, 1, 4]));
        assert_eq!(game.parse_answer("31x"), None);
        assert_eq!(game.parse_answer("  "), None);
    }

    #[test]
    fn test_wrong_order_is_incorrect() {
        let mut game = DigitDetective::default();
        let challenge = Challenge::new(
            Sequence {
                digits: vec![1, 2, 3],
                display_ms: 1000,
            },
            vec![1, 2, 3],
        );
        assert_eq!(game.judge(&challenge, &vec![3, 2, 1]), crate::round::Verdict::Incorrect);
        assert_eq!(game.judge(&challenge, &vec![1, 2, 3]), crate::round::Verdict::Correct);
    }

    #[test]
    fn test_reveal_covers_every_digit() {
        let game = DigitDetective::default();
        let seq = Sequence {
            digits: vec![5, 5, 5, 5],
            display_ms: 700,
        };
        assert_eq!(game.reveal_time(&seq), Some(Duration::from_millis(4000)));
        assert_eq!(seq.to_string(), "5 5 5 5");
    }
}
