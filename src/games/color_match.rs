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

const AGREEMENT_CHANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
    ];

    /// Full names or any prefix; every color starts with a distinct letter
    fn parse(input: &str) -> Option<Color> {
        let input = input.to_lowercase();
        if input.is_empty() {
            return None;
        }
        Color::ALL
            .into_iter()
            .find(|c| c.to_string().starts_with(&input))
    }
}

/// Which attribute of the word the player has to name
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Mode {
    Color,
    Word,
}

impl Mode {
    /// Starts on ink color and flips on every even level
    pub fn for_level(level: u32) -> Mode {
        if (level / 2) % 2 == 0 {
            Mode::Color
        } else {
            Mode::Word
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWord {
    pub word: Color,
    pub ink: Color,
    pub mode: Mode,
}

impl fmt::Display for ColorWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.word.to_string().to_uppercase();
        let ask = match self.mode {
            Mode::Color => "name the INK",
            Mode::Word => "name the WORD",
        };
        write!(f, "{word} written in {} ink - {ask}", self.ink)
    }
}

/// Stroop test: the word names one color and is printed in another
#[derive(Debug)]
pub struct ColorMatch {
    rng: StdRng,
}

impl Default for ColorMatch {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl ColorMatch {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RoundGenerator for ColorMatch {
    type Prompt = ColorWord;
    type Answer = Color;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<ColorWord, Color> {
        let word = *Color::ALL.choose(&mut self.rng).unwrap_or(&Color::Red);
        let ink = if self.rng.gen_bool(AGREEMENT_CHANCE) {
            word
        } else {
            let others: Vec<Color> = Color::ALL.into_iter().filter(|&c| c != word).collect();
            *others.choose(&mut self.rng).unwrap_or(&word)
        };
        let mode = Mode::for_level(ctx.level);
        let expected = match mode {
            Mode::Color => ink,
            Mode::Word => word,
        };
        Challenge::new(ColorWord { word, ink, mode }, expected)
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        format!("{}% accuracy - Mode: {}", ctx.accuracy, Mode::for_level(ctx.level))
    }
}

impl Game for ColorMatch {
    fn kind(&self) -> GameKind {
        GameKind::ColorMatch
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(800),
            round_time: Some(Param::RoundTimeMs),
            reward: RewardFormula {
                base: BasePoints::Fixed(10),
                time_bonus: TimeBonus::RemainingMillis { per_point: 100 },
                level_multiplier: 3,
            },
            trigger: LevelUpTrigger::Streak(5),
            rules: vec![DifficultyRule::decreasing(Param::RoundTimeMs, 3000, 300, 1200)],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Color> {
        Color::parse(input)
    }

    fn answer_hint(&self) -> &'static str {
        "type a color: red, blue, green, yellow or purple"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyController;

    #[test]
    fn test_mode_flips_every_second_level() {
        let modes: Vec<Mode> = (1..=6).map(Mode::for_level).collect();
        assert_eq!(
            modes,
            vec![
                Mode::Color,
                Mode::Word,
                Mode::Word,
                Mode::Color,
                Mode::Color,
                Mode::Word
            ]
        );
    }

    #[test]
    fn test_expected_answer_follows_mode() {
        let mut game = ColorMatch::with_rng(StdRng::seed_from_u64(9));
        let mut dc = DifficultyController::new(LevelUpTrigger::Streak(5), vec![]).unwrap();

        for level in 1..=4 {
            for i in 0..20 {
                let round = game.next_round(&RoundContext {
                    index: i,
                    level,
                    difficulty: &dc,
                });
                let p = round.prompt;
                let want = if Mode::for_level(level) == Mode::Color { p.ink } else { p.word };
                assert_eq!(round.expected, vec![want]);
                assert_eq!(p.mode, Mode::for_level(level));
            }
            dc.level_up();
        }
    }

    #[test]
    fn test_word_and_ink_mostly_disagree() {
        let mut game = ColorMatch::with_rng(StdRng::seed_from_u64(21));
        let dc = DifficultyController::new(LevelUpTrigger::Streak(5), vec![]).unwrap();
        let agree = (0..1000)
            .filter(|&i| {
                let p = game
                    .next_round(&RoundContext {
                        index: i,
                        level: 1,
                        difficulty: &dc,
                    })
                    .prompt;
                p.word == p.ink
            })
            .count();
        assert!((200..420).contains(&agree), "{agree} agreements");
    }

    #[test]
    fn test_parses_names_and_prefixes() {
        let game = ColorMatch::default();
        assert_eq!(game.parse_answer("Purple"), Some(Color::Purple));
        assert_eq!(game.parse_answer("g"), Some(Color::Green));
        assert_eq!(game.parse_answer("orange"), None);
        assert_eq!(game.parse_answer(""), None);
    }

    #[test]
    fn test_label_names_the_mode() {
        let game = ColorMatch::default();
        let dc = DifficultyController::new(LevelUpTrigger::Streak(5), vec![]).unwrap();
        let label = game.progress_label(&ProgressContext {
            level: 2,
            accuracy: 83,
            correct_count: 5,
            total_count: 6,
            difficulty: &dc,
        });
        assert_eq!(label, "83% accuracy - Mode: Word");
    }
}
