//! The game catalog: one [`RoundGenerator`] per minigame plus the
//! type-erased [`GameSession`] the front end drives.

use clap::ValueEnum;
use derive_more::{Display, Error, From};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::error::SessionError;
use crate::round::RoundGenerator;
use crate::session::{
    Phase, Resolution, Session, SessionConfig, SessionEvent, SessionSummary, StatsReport,
};

pub mod brain_shift;
pub mod chalkboard;
pub mod color_match;
pub mod digit_detective;
pub mod lost_in_migration;
pub mod memory_matrix;
pub mod spatial_speed;
pub mod speed_match;
pub mod word_bubbles;

pub use brain_shift::BrainShift;
pub use chalkboard::Chalkboard;
pub use color_match::ColorMatch;
pub use digit_detective::DigitDetective;
pub use lost_in_migration::LostInMigration;
pub use memory_matrix::MemoryMatrix;
pub use spatial_speed::SpatialSpeed;
pub use speed_match::SpeedMatch;
pub use word_bubbles::WordBubbles;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameKind {
    MemoryMatrix,
    SpeedMatch,
    ColorMatch,
    WordBubbles,
    Chalkboard,
    LostInMigration,
    BrainShift,
    DigitDetective,
    SpatialSpeed,
}

impl GameKind {
    pub const ALL: [GameKind; 9] = [
        GameKind::MemoryMatrix,
        GameKind::SpeedMatch,
        GameKind::ColorMatch,
        GameKind::WordBubbles,
        GameKind::Chalkboard,
        GameKind::LostInMigration,
        GameKind::BrainShift,
        GameKind::DigitDetective,
        GameKind::SpatialSpeed,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::MemoryMatrix => "Memory Matrix",
            GameKind::SpeedMatch => "Speed Match",
            GameKind::ColorMatch => "Color Match",
            GameKind::WordBubbles => "Word Bubbles",
            GameKind::Chalkboard => "Chalkboard Challenge",
            GameKind::LostInMigration => "Lost in Migration",
            GameKind::BrainShift => "Brain Shift",
            GameKind::DigitDetective => "Digit Detective",
            GameKind::SpatialSpeed => "Spatial Speed",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            GameKind::MemoryMatrix => "recall the lit cells in order",
            GameKind::SpeedMatch => "does the symbol match the previous one?",
            GameKind::ColorMatch => "name the ink or the word, whichever is asked",
            GameKind::WordBubbles => "words starting with the given letter",
            GameKind::Chalkboard => "mental arithmetic against the clock",
            GameKind::LostInMigration => "direction of the middle bird",
            GameKind::BrainShift => "judge the number or the shape",
            GameKind::DigitDetective => "repeat the digit sequence",
            GameKind::SpatialSpeed => "find the odd one out",
        }
    }
}

/// A minigame: a round generator that also knows its tuning and how to
/// read typed answers.
pub trait Game: RoundGenerator {
    fn kind(&self) -> GameKind;

    fn session_config(&self) -> SessionConfig;

    fn parse_answer(&self, input: &str) -> Option<Self::Answer>;

    fn answer_hint(&self) -> &'static str;

    /// How long the prompt stays visible before the player must answer
    /// from memory. `None` keeps it on screen for the whole round.
    fn reveal_time(&self, _prompt: &Self::Prompt) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SubmitError {
    #[display("could not read {input:?} as an answer ({hint})")]
    Unparsable { input: String, hint: &'static str },
    #[display("{_0}")]
    #[from]
    Session(#[error(source)] SessionError),
}

/// Session overrides coming from the command line or the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOverrides {
    pub duration: Option<Duration>,
    pub feedback_delay: Option<Duration>,
}

impl SessionOverrides {
    pub fn apply(&self, mut config: SessionConfig) -> SessionConfig {
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(delay) = self.feedback_delay {
            config.feedback_delay = delay;
        }
        config
    }
}

/// Object-safe view of a running game, with prompts rendered to text
pub trait GameSession {
    fn kind(&self) -> GameKind;
    fn phase(&self) -> Phase;
    fn duration(&self) -> Duration;
    fn start(&mut self) -> Result<(), SessionError>;
    fn submit_text(&mut self, input: &str) -> Result<Resolution, SubmitError>;
    fn poll(&mut self) -> usize;
    fn next_wakeup(&self) -> Option<Instant>;
    /// Ends the session early, as if its time had run out
    fn finish(&mut self) -> Option<SessionSummary>;
    fn stats(&self) -> StatsReport;
    fn summary(&self) -> SessionSummary;
    /// The pending prompt, or `None` once its reveal time has passed
    fn prompt_text(&self) -> Option<String>;
    fn round_remaining(&self) -> Option<Duration>;
    fn answer_hint(&self) -> &'static str;
    fn drain_events(&mut self) -> Vec<SessionEvent<String>>;
}

struct Live<G, C>
where
    G: Game,
    C: Clock,
{
    session: Session<G, C, Vec<SessionEvent<G::Prompt>>>,
    clock: C,
}

impl<G, C> GameSession for Live<G, C>
where
    G: Game,
    G::Prompt: fmt::Display,
    C: Clock + Clone,
{
    fn kind(&self) -> GameKind {
        self.session.generator().kind()
    }

    fn phase(&self) -> Phase {
        self.session.phase()
    }

    fn duration(&self) -> Duration {
        self.session.config().duration
    }

    fn start(&mut self) -> Result<(), SessionError> {
        self.session.start()
    }

    fn submit_text(&mut self, input: &str) -> Result<Resolution, SubmitError> {
        let game = self.session.generator();
        let answer = game
            .parse_answer(input.trim())
            .ok_or_else(|| SubmitError::Unparsable {
                input: input.to_string(),
                hint: game.answer_hint(),
            })?;
        Ok(self.session.submit_answer(answer)?)
    }

    fn poll(&mut self) -> usize {
        self.session.poll()
    }

    fn next_wakeup(&self) -> Option<Instant> {
        self.session.next_wakeup()
    }

    fn finish(&mut self) -> Option<SessionSummary> {
        self.session.on_session_timeout()
    }

    fn stats(&self) -> StatsReport {
        self.session.stats()
    }

    fn summary(&self) -> SessionSummary {
        self.session.summary()
    }

    fn prompt_text(&self) -> Option<String> {
        let round = self.session.current_round()?;
        if let Some(reveal) = self.session.generator().reveal_time(round.prompt()) {
            if self.clock.now().saturating_duration_since(round.started_at()) >= reveal {
                return None;
            }
        }
        Some(round.prompt().to_string())
    }

    fn round_remaining(&self) -> Option<Duration> {
        self.session.current_round()?.remaining(self.clock.now())
    }

    fn answer_hint(&self) -> &'static str {
        self.session.generator().answer_hint()
    }

    fn drain_events(&mut self) -> Vec<SessionEvent<String>> {
        self.session
            .sink_mut()
            .drain(..)
            .map(|e| e.map_prompt(|p| p.to_string()))
            .collect()
    }
}

fn live<G, C>(game: G, overrides: SessionOverrides, clock: C) -> Result<Box<dyn GameSession>, SessionError>
where
    G: Game + 'static,
    G::Prompt: fmt::Display,
    C: Clock + Clone + 'static,
{
    let config = overrides.apply(game.session_config());
    let session = Session::new(config, game, clock.clone(), Vec::new())?;
    Ok(Box::new(Live { session, clock }))
}

/// Builds a ready-to-start session for `kind`.
pub fn build<C>(kind: GameKind, overrides: SessionOverrides, clock: C) -> Result<Box<dyn GameSession>, SessionError>
where
    C: Clock + Clone + 'static,
{
    build_with_rng(kind, overrides, clock, StdRng::from_entropy())
}

/// Like [`build`] with a caller-supplied generator, for reproducible sessions
pub fn build_with_rng<C>(
    kind: GameKind,
    overrides: SessionOverrides,
    clock: C,
    rng: StdRng,
) -> Result<Box<dyn GameSession>, SessionError>
where
    C: Clock + Clone + 'static,
{
    match kind {
        GameKind::MemoryMatrix => live(MemoryMatrix::with_rng(rng), overrides, clock),
        GameKind::SpeedMatch => live(SpeedMatch::with_rng(rng), overrides, clock),
        GameKind::ColorMatch => live(ColorMatch::with_rng(rng), overrides, clock),
        GameKind::WordBubbles => live(WordBubbles::with_rng(rng), overrides, clock),
        GameKind::Chalkboard => live(Chalkboard::with_rng(rng), overrides, clock),
        GameKind::LostInMigration => live(LostInMigration::with_rng(rng), overrides, clock),
        GameKind::BrainShift => live(BrainShift::with_rng(rng), overrides, clock),
        GameKind::DigitDetective => live(DigitDetective::with_rng(rng), overrides, clock),
        GameKind::SpatialSpeed => live(SpatialSpeed::with_rng(rng), overrides, clock),
    }
}
