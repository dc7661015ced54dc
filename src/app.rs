use tracing::{debug, warn};

use crate::games::{GameKind, GameSession, SubmitError};
use crate::round::RoundOutcome;
use crate::session::{Phase, SessionEvent, SessionSummary, StatsReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Ready,
    Playing,
    Results,
}

/// Result of the last resolved round, kept on screen until the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub outcome: RoundOutcome,
    pub points: u64,
}

impl Feedback {
    pub fn message(&self) -> String {
        match self.outcome {
            RoundOutcome::Correct => format!("Correct! +{} points", self.points),
            RoundOutcome::Incorrect => "Incorrect".to_string(),
            RoundOutcome::TimedOut => "Too slow!".to_string(),
            RoundOutcome::Pending => String::new(),
        }
    }
}

/// Terminal front end state around one game session
pub struct App {
    game: Box<dyn GameSession>,
    pub state: AppState,
    pub input: String,
    pub feedback: Option<Feedback>,
    pub notice: Option<String>,
    pub stats: StatsReport,
    pub summary: Option<SessionSummary>,
    pub best_score: Option<u64>,
}

impl App {
    pub fn new(game: Box<dyn GameSession>, best_score: Option<u64>) -> Self {
        let stats = game.stats();
        Self {
            game,
            state: AppState::Ready,
            input: String::new(),
            feedback: None,
            notice: None,
            stats,
            summary: None,
            best_score,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn game(&self) -> &dyn GameSession {
        self.game.as_ref()
    }

    pub fn start(&mut self) {
        self.input.clear();
        self.feedback = None;
        self.notice = None;
        self.summary = None;
        match self.game.start() {
            Ok(()) => self.state = AppState::Playing,
            Err(err) => warn!(%err, "start rejected"),
        }
        self.absorb_events();
    }

    pub fn on_char(&mut self, c: char) {
        if self.state == AppState::Playing {
            self.input.push(c);
        }
    }

    pub fn on_backspace(&mut self) {
        self.input.pop();
    }

    /// Submits the typed answer; the input is kept if it could not be read
    pub fn on_enter(&mut self) -> Option<SessionSummary> {
        if self.state != AppState::Playing || self.input.trim().is_empty() {
            return None;
        }

        match self.game.submit_text(&self.input) {
            Ok(_) => {
                self.input.clear();
                self.notice = None;
            }
            Err(SubmitError::Unparsable { hint, .. }) => {
                self.notice = Some(hint.to_string());
            }
            Err(SubmitError::Session(err)) => {
                if self.game.phase() == Phase::ShowingFeedback {
                    self.notice = Some("wait for the next round".to_string());
                } else {
                    warn!(%err, "answer rejected");
                }
            }
        }
        self.on_tick()
    }

    /// Fires due timers; returns the summary if the session just ended
    pub fn on_tick(&mut self) -> Option<SessionSummary> {
        self.game.poll();
        self.absorb_events()
    }

    /// Gives up on the running session
    pub fn quit_session(&mut self) -> Option<SessionSummary> {
        self.game.finish();
        self.absorb_events()
    }

    fn absorb_events(&mut self) -> Option<SessionSummary> {
        let mut ended = None;
        for event in self.game.drain_events() {
            match event {
                SessionEvent::Stats(stats) => self.stats = stats,
                SessionEvent::RoundResolved { outcome, points, .. } => {
                    self.feedback = Some(Feedback { outcome, points });
                }
                SessionEvent::LevelUp(up) => {
                    self.notice = Some(format!("Level {}!", up.level));
                }
                SessionEvent::Ended(summary) => {
                    debug!(game = %self.game.kind(), score = summary.score, "results shown");
                    self.best_score = Some(self.best_score.unwrap_or(0).max(summary.score));
                    self.state = AppState::Results;
                    self.input.clear();
                    self.summary = Some(summary.clone());
                    ended = Some(summary);
                }
                SessionEvent::Started { .. } | SessionEvent::RoundStarted { .. } => {}
            }
        }
        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::games::{build_with_rng, SessionOverrides};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn app(kind: GameKind, clock: &ManualClock) -> App {
        let overrides = SessionOverrides {
            duration: Some(Duration::from_secs(5)),
            feedback_delay: None,
        };
        let game =
            build_with_rng(kind, overrides, clock.clone(), StdRng::seed_from_u64(42)).unwrap();
        App::new(game, Some(10))
    }

    #[test]
    fn test_starts_in_ready_state() {
        let clock = ManualClock::new();
        let mut app = app(GameKind::Chalkboard, &clock);
        assert_eq!(app.state, AppState::Ready);
        app.start();
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.stats.level, 1);
    }

    #[test]
    fn test_unreadable_answer_keeps_input_and_shows_hint() {
        let clock = ManualClock::new();
        let mut app = app(GameKind::Chalkboard, &clock);
        app.start();
        for c in "abc".chars() {
            app.on_char(c);
        }
        app.on_enter();
        assert_eq!(app.input, "abc");
        assert_eq!(app.notice.as_deref(), Some("type the result as a whole number"));
        assert!(app.feedback.is_none());
    }

    #[test]
    fn test_wrong_answer_shows_feedback() {
        let clock = ManualClock::new();
        let mut app = app(GameKind::Chalkboard, &clock);
        app.start();
        // every chalkboard result is non-negative
        for c in "-1".chars() {
            app.on_char(c);
        }
        app.on_enter();
        assert!(app.input.is_empty());
        assert_eq!(
            app.feedback,
            Some(Feedback {
                outcome: RoundOutcome::Incorrect,
                points: 0
            })
        );
    }

    #[test]
    fn test_session_end_moves_to_results_and_tracks_best() {
        let clock = ManualClock::new();
        let mut app = app(GameKind::WordBubbles, &clock);
        app.start();
        clock.advance_ms(5_000);

        let summary = app.on_tick().expect("session ended");
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.summary, Some(summary));
        assert_eq!(app.best_score, Some(10));

        app.start();
        assert_eq!(app.state, AppState::Playing);
        assert!(app.summary.is_none());
    }

    #[test]
    fn test_quitting_ends_the_session() {
        let clock = ManualClock::new();
        let mut app = app(GameKind::SpeedMatch, &clock);
        app.start();
        assert!(app.quit_session().is_some());
        assert_eq!(app.state, AppState::Results);
    }
}
