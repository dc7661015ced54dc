use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use crate::round::{Challenge, ProgressContext, RoundContext, RoundGenerator, Verdict};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];

    pub fn glyph(&self) -> char {
        match self {
            Shape::Circle => '●',
            Shape::Square => '■',
            Shape::Triangle => '▲',
        }
    }
}

/// Correct answers between rule switches, once past level 1
const SWITCH_EVERY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Rule {
    Number,
    Shape,
}

impl Rule {
    pub fn toggled(self) -> Rule {
        match self {
            Rule::Number => Rule::Shape,
            Rule::Shape => Rule::Number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Number(u8),
    Shape(Shape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub number: u8,
    pub shape: Shape,
    pub rule: Rule,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}  - sort by {}",
            self.shape.glyph(),
            self.number,
            self.shape.glyph(),
            self.rule.to_string().to_uppercase()
        )
    }
}

/// Task switching between two classification rules.
///
/// The rule flips on every third correct answer of the session once the
/// player has reached level 2. The check runs when the next card is dealt,
/// so it sees the level after any level-up the answer caused.
#[derive(Debug)]
pub struct BrainShift {
    rng: StdRng,
    rule: Rule,
    correct_answers: u32,
    answered_correctly: bool,
}

impl Default for BrainShift {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl BrainShift {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            rule: Rule::Number,
            correct_answers: 0,
            answered_correctly: false,
        }
    }
}

impl RoundGenerator for BrainShift {
    type Prompt = Card;
    type Answer = Classification;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Card, Classification> {
        if std::mem::take(&mut self.answered_correctly)
            && ctx.level >= 2
            && self.correct_answers % SWITCH_EVERY == 0
        {
            self.rule = self.rule.toggled();
        }

        let card = Card {
            number: self.rng.gen_range(1..=3),
            shape: *Shape::ALL.choose(&mut self.rng).unwrap_or(&Shape::Circle),
            rule: self.rule,
        };
        let expected = match card.rule {
            Rule::Number => Classification::Number(card.number),
            Rule::Shape => Classification::Shape(card.shape),
        };
        Challenge::new(card, expected)
    }

    fn judge(&mut self, challenge: &Challenge<Card, Classification>, answer: &Classification) -> Verdict {
        if challenge.expected.contains(answer) {
            self.correct_answers += 1;
            self.answered_correctly = true;
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        format!("{}% accuracy - Mode: {}", ctx.accuracy, self.rule)
    }

    fn reset(&mut self) {
        self.rule = Rule::Number;
        self.correct_answers = 0;
        self.answered_correctly = false;
    }
}

impl Game for BrainShift {
    fn kind(&self) -> GameKind {
        GameKind::BrainShift
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
            rules: vec![DifficultyRule::decreasing(Param::RoundTimeMs, 3000, 300, 1000)],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Classification> {
        match input.to_lowercase().as_str() {
            "1" => Some(Classification::Number(1)),
            "2" => Some(Classification::Number(2)),
            "3" => Some(Classification::Number(3)),
            "c" | "circle" | "o" | "●" => Some(Classification::Shape(Shape::Circle)),
            "s" | "square" | "■" => Some(Classification::Shape(Shape::Square)),
            "t" | "triangle" | "▲" => Some(Classification::Shape(Shape::Triangle)),
            _ => None,
        }
    }

    fn answer_hint(&self) -> &'static str {
        "a number 1-3, or c/s/t for circle, square, triangle"
    }
}
