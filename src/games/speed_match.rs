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

const SYMBOLS: [char; 8] = ['★', '♦', '♠', '♣', '♥', '◆', '▲', '●'];
const REPEAT_CHANCE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Same,
    Different,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub symbol: char,
    /// Shown alongside the first card of a session, which has nothing
    /// before it to compare against
    pub reference: Option<char>,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference {
            Some(reference) => write!(f, "{reference}  ->  {}", self.symbol),
            None => write!(f, "{}", self.symbol),
        }
    }
}

/// Same or different from the previous symbol
#[derive(Debug)]
pub struct SpeedMatch {
    rng: StdRng,
    previous: Option<char>,
}

impl Default for SpeedMatch {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl SpeedMatch {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            previous: None,
        }
    }

    fn pick_other_than(&mut self, avoid: char) -> char {
        let others: Vec<char> = SYMBOLS.iter().copied().filter(|&s| s != avoid).collect();
        *others.choose(&mut self.rng).unwrap_or(&avoid)
    }
}

impl RoundGenerator for SpeedMatch {
    type Prompt = Card;
    type Answer = Match;

    fn next_round(&mut self, _ctx: &RoundContext<'_>) -> Challenge<Card, Match> {
        let (previous, reference) = match self.previous {
            Some(previous) => (previous, None),
            None => {
                let first = *SYMBOLS.choose(&mut self.rng).unwrap_or(&SYMBOLS[0]);
                (first, Some(first))
            }
        };

        let symbol = if self.rng.gen_bool(REPEAT_CHANCE) {
            previous
        } else {
            self.pick_other_than(previous)
        };
        self.previous = Some(symbol);

        let expected = if symbol == previous {
            Match::Same
        } else {
            Match::Different
        };
        Challenge::new(Card { symbol, reference }, expected)
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

impl Game for SpeedMatch {
    fn kind(&self) -> GameKind {
        GameKind::SpeedMatch
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(800),
            round_time: Some(Param::RoundTimeMs),
            reward: RewardFormula {
                base: BasePoints::Fixed(10),
                time_bonus: TimeBonus::RemainingMillis { per_point: 100 },
                level_multiplier: 2,
            },
            trigger: LevelUpTrigger::Streak(5),
            rules: vec![DifficultyRule::decreasing(Param::RoundTimeMs, 3000, 300, 1000)],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Match> {
        match input.to_lowercase().as_str() {
            "y" | "yes" | "s" | "same" | "=" => Some(Match::Same),
            "n" | "no" | "d" | "different" | "!=" => Some(Match::Different),
            _ => None,
        }
    }

    fn answer_hint(&self) -> &'static str {
        "y = same as before, n = different"
    }
}
