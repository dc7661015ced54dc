use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::LevelUpTrigger;
use crate::round::{Challenge, ProgressContext, RoundContext, RoundGenerator, Verdict};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

const LETTERS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'l', 'm', 'n', 'o', 'p', 'r', 's', 't', 'w',
];
const MIN_WORD_LEN: usize = 3;

/// Points for an accepted word: longer words are worth more
pub fn word_points(word: &str) -> u64 {
    (word.chars().count() as u64 * 2).max(5)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterPrompt {
    pub letter: char,
    pub found: usize,
}

impl fmt::Display for LetterPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Words starting with \"{}\"  ({} so far)",
            self.letter.to_ascii_uppercase(),
            self.found
        )
    }
}

/// Why a word was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Rejection {
    #[strum(serialize = "too short")]
    TooShort,
    #[strum(serialize = "wrong first letter")]
    WrongLetter,
    #[strum(serialize = "already used")]
    AlreadyUsed,
    #[strum(serialize = "not a word")]
    NotAWord,
}

/// Verbal fluency: as many words as possible from one starting letter.
///
/// Every submission is a round. The letter is fixed for the whole session.
#[derive(Debug)]
pub struct WordBubbles {
    rng: StdRng,
    letter: Option<char>,
    used: HashSet<String>,
}

impl Default for WordBubbles {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl WordBubbles {
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            letter: None,
            used: HashSet::new(),
        }
    }

    pub fn letter(&self) -> Option<char> {
        self.letter
    }

    pub fn used_words(&self) -> &HashSet<String> {
        &self.used
    }

    fn current_letter(&mut self) -> char {
        match self.letter {
            Some(letter) => letter,
            None => {
                let letter = *LETTERS.choose(&mut self.rng).unwrap_or(&'a');
                self.letter = Some(letter);
                letter
            }
        }
    }

    pub fn check(&self, word: &str) -> Result<(), Rejection> {
        if word.chars().count() < MIN_WORD_LEN {
            return Err(Rejection::TooShort);
        }
        if !word.chars().all(char::is_alphabetic) {
            return Err(Rejection::NotAWord);
        }
        if word.chars().next() != self.letter {
            return Err(Rejection::WrongLetter);
        }
        if self.used.contains(word) {
            return Err(Rejection::AlreadyUsed);
        }
        Ok(())
    }
}

impl RoundGenerator for WordBubbles {
    type Prompt = LetterPrompt;
    type Answer = String;

    fn next_round(&mut self, _ctx: &RoundContext<'_>) -> Challenge<LetterPrompt, String> {
        let letter = self.current_letter();
        Challenge::open(LetterPrompt {
            letter,
            found: self.used.len(),
        })
    }

    fn judge(&mut self, _challenge: &Challenge<LetterPrompt, String>, answer: &String) -> Verdict {
        let word = answer.to_lowercase();
        match self.check(&word) {
            Ok(()) => {
                let points = word_points(&word);
                self.used.insert(word);
                Verdict::CorrectWithBase(points)
            }
            Err(reason) => {
                tracing::debug!(%word, %reason, "word rejected");
                Verdict::Incorrect
            }
        }
    }

    fn progress_label(&self, _ctx: &ProgressContext<'_>) -> String {
        format!("{} words", self.used.len())
    }

    fn reset(&mut self) {
        self.letter = None;
        self.used.clear();
    }
}

impl Game for WordBubbles {
    fn kind(&self) -> GameKind {
        GameKind::WordBubbles
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::ZERO,
            round_time: None,
            reward: RewardFormula {
                base: BasePoints::Fixed(5),
                time_bonus: TimeBonus::None,
                level_multiplier: 0,
            },
            trigger: LevelUpTrigger::Cumulative(5),
            rules: Vec::new(),
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<String> {
        let word = input.trim();
        (!word.is_empty()).then(|| word.to_string())
    }

    fn answer_hint(&self) -> &'static str {
        "type a word of three or more letters"
    }
}
