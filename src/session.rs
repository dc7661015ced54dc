use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::difficulty::{DifficultyController, DifficultyRule, LevelUp, LevelUpTrigger, Param};
use crate::error::SessionError;
use crate::round::{
    ProgressContext, Round, RoundContext, RoundGenerator, RoundOutcome, Verdict,
};
use crate::scoring::{compute_accuracy, BasePoints, RewardFormula, TimeWindow};
use crate::timer::{TimerHandle, TimerSlot};

pub const DEFAULT_SESSION_SECS: u64 = 60;
pub const TICK_RATE_MS: u64 = 1000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    #[strum(serialize = "awaiting input")]
    AwaitingInput,
    #[strum(serialize = "showing feedback")]
    ShowingFeedback,
    Ended,
}

/// Everything that varies between games
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub duration: Duration,
    pub tick_interval: Duration,
    pub feedback_delay: Duration,
    /// Difficulty parameter holding the per-round budget in milliseconds;
    /// `None` for games without a round deadline
    pub round_time: Option<Param>,
    pub reward: RewardFormula,
    pub trigger: LevelUpTrigger,
    pub rules: Vec<DifficultyRule>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(DEFAULT_SESSION_SECS),
            tick_interval: Duration::from_millis(TICK_RATE_MS),
            feedback_delay: Duration::from_millis(800),
            round_time: None,
            reward: RewardFormula::default(),
            trigger: LevelUpTrigger::Streak(5),
            rules: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.duration.is_zero() {
            return Err(SessionError::configuration("session duration must be positive"));
        }
        if self.tick_interval.is_zero() {
            return Err(SessionError::configuration("tick interval must be positive"));
        }
        if let Some(param) = self.round_time {
            let rule = self
                .rules
                .iter()
                .find(|r| r.param == param)
                .ok_or_else(|| {
                    SessionError::configuration(format!("round time parameter {param} has no rule"))
                })?;
            if rule.limit() == 0 || rule.initial == 0 {
                return Err(SessionError::configuration(format!(
                    "round time parameter {param} can reach zero"
                )));
            }
        }
        if let BasePoints::PerParam { param, .. } = self.reward.base {
            if !self.rules.iter().any(|r| r.param == param) {
                return Err(SessionError::configuration(format!(
                    "reward scales with {param}, which has no rule"
                )));
            }
        }
        Ok(())
    }
}

/// Live statistics for the host display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub score: u64,
    pub elapsed_secs: u64,
    pub level: u32,
    pub progress_label: String,
}

/// Final results handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub level: u32,
    pub correct_count: u32,
    pub total_count: u32,
    pub accuracy: u32,
}

/// Result of resolving a round by answer or timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub index: u32,
    pub outcome: RoundOutcome,
    pub points: u64,
    pub level_up: Option<LevelUp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent<P> {
    Started {
        duration: Duration,
    },
    RoundStarted {
        index: u32,
        prompt: P,
        budget: Option<Duration>,
        level: u32,
    },
    RoundResolved {
        index: u32,
        outcome: RoundOutcome,
        points: u64,
    },
    LevelUp(LevelUp),
    Stats(StatsReport),
    Ended(SessionSummary),
}

impl<P> SessionEvent<P> {
    pub fn map_prompt<Q>(self, f: impl FnOnce(P) -> Q) -> SessionEvent<Q> {
        match self {
            SessionEvent::Started { duration } => SessionEvent::Started { duration },
            SessionEvent::RoundStarted {
                index,
                prompt,
                budget,
                level,
            } => SessionEvent::RoundStarted {
                index,
                prompt: f(prompt),
                budget,
                level,
            },
            SessionEvent::RoundResolved {
                index,
                outcome,
                points,
            } => SessionEvent::RoundResolved {
                index,
                outcome,
                points,
            },
            SessionEvent::LevelUp(up) => SessionEvent::LevelUp(up),
            SessionEvent::Stats(stats) => SessionEvent::Stats(stats),
            SessionEvent::Ended(summary) => SessionEvent::Ended(summary),
        }
    }
}

/// Receiver of outbound session events
pub trait EventSink<P> {
    fn emit(&mut self, event: SessionEvent<P>);
}

impl<P> EventSink<P> for Vec<SessionEvent<P>> {
    fn emit(&mut self, event: SessionEvent<P>) {
        self.push(event);
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<P> EventSink<P> for NullSink {
    fn emit(&mut self, _event: SessionEvent<P>) {}
}

// Ordered so that a session end due at the same instant as a round
// deadline wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TimerKind {
    Tick,
    Round,
    Feedback,
}

/// One timed play-through of a game
pub struct Session<G, C, S>
where
    G: RoundGenerator,
    C: Clock,
    S: EventSink<G::Prompt>,
{
    config: SessionConfig,
    generator: G,
    clock: C,
    sink: S,
    difficulty: DifficultyController,
    phase: Phase,
    score: u64,
    correct_count: u32,
    total_count: u32,
    elapsed_secs: u64,
    started_at: Option<Instant>,
    rounds_started: u32,
    current: Option<Round<G::Prompt, G::Answer>>,
    round_timer: TimerSlot,
    feedback_timer: TimerSlot,
    tick_timer: TimerSlot,
}

impl<G, C, S> Session<G, C, S>
where
    G: RoundGenerator,
    C: Clock,
    S: EventSink<G::Prompt>,
{
    pub fn new(config: SessionConfig, generator: G, clock: C, sink: S) -> Result<Self, SessionError> {
        config.validate()?;
        let difficulty = DifficultyController::new(config.trigger, config.rules.clone())?;

        Ok(Self {
            config,
            generator,
            clock,
            sink,
            difficulty,
            phase: Phase::Idle,
            score: 0,
            correct_count: 0,
            total_count: 0,
            elapsed_secs: 0,
            started_at: None,
            rounds_started: 0,
            current: None,
            round_timer: TimerSlot::new(),
            feedback_timer: TimerSlot::new(),
            tick_timer: TimerSlot::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::AwaitingInput | Phase::ShowingFeedback)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.difficulty.level()
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.difficulty.consecutive_correct()
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn accuracy(&self) -> u32 {
        compute_accuracy(self.correct_count, self.total_count)
    }

    pub fn param(&self, param: Param) -> Option<u64> {
        self.difficulty.param(param)
    }

    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    pub fn current_round(&self) -> Option<&Round<G::Prompt, G::Answer>> {
        self.current.as_ref()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> StatsReport {
        let progress = ProgressContext {
            level: self.level(),
            accuracy: self.accuracy(),
            correct_count: self.correct_count,
            total_count: self.total_count,
            difficulty: &self.difficulty,
        };
        StatsReport {
            score: self.score,
            elapsed_secs: self.elapsed_secs,
            level: self.level(),
            progress_label: self.generator.progress_label(&progress),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            level: self.level(),
            correct_count: self.correct_count,
            total_count: self.total_count,
            accuracy: self.accuracy(),
        }
    }

    /// Earliest armed deadline, for drivers that sleep between events
    pub fn next_wakeup(&self) -> Option<Instant> {
        [
            self.tick_timer.due(),
            self.round_timer.due(),
            self.feedback_timer.due(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Begins a fresh session, replacing everything a previous one left behind.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(self.invalid("start"));
        }

        let now = self.clock.now();
        self.cancel_timers();
        self.current = None;
        self.score = 0;
        self.correct_count = 0;
        self.total_count = 0;
        self.elapsed_secs = 0;
        self.rounds_started = 0;
        self.difficulty.reset();
        self.generator.reset();
        self.started_at = Some(now);
        self.tick_timer.arm(now + self.config.tick_interval.min(self.config.duration));

        info!(duration = ?self.config.duration, "session started");
        self.sink.emit(SessionEvent::Started {
            duration: self.config.duration,
        });
        self.begin_round(now);
        self.emit_stats();
        Ok(())
    }

    /// Judges an answer to the pending round.
    ///
    /// Timers that came due before the answer fire first, so the answer
    /// lands on whatever round is pending at that moment: a passed deadline
    /// wins over it, and an elapsed feedback pause hands it the next round.
    pub fn submit_answer(&mut self, answer: G::Answer) -> Result<Resolution, SessionError> {
        self.poll();
        if self.phase != Phase::AwaitingInput {
            return Err(self.invalid("submit an answer"));
        }

        let now = self.clock.now();
        let Some(round) = self.current.as_ref() else {
            return Err(self.invalid("submit an answer"));
        };
        let verdict = self.generator.judge(round.challenge(), &answer);
        let window = self.time_window(round, now);
        debug!(index = round.index(), ?answer, ?verdict, "answer judged");

        let (outcome, base_override) = match verdict {
            Verdict::Correct => (RoundOutcome::Correct, None),
            Verdict::CorrectWithBase(base) => (RoundOutcome::Correct, Some(base)),
            Verdict::Incorrect => (RoundOutcome::Incorrect, None),
        };
        Ok(self.resolve(outcome, base_override, window, now))
    }

    /// Resolves the pending round as timed out; `None` if nothing is pending.
    pub fn on_round_timeout(&mut self) -> Option<Resolution> {
        let now = self.clock.now();
        self.time_out_round(now)
    }

    fn time_out_round(&mut self, at: Instant) -> Option<Resolution> {
        if self.phase != Phase::AwaitingInput {
            return None;
        }
        let total = self.current.as_ref()?.budget().unwrap_or(Duration::ZERO);
        Some(self.resolve(RoundOutcome::TimedOut, None, TimeWindow::expired(total), at))
    }

    /// Ends the session. A pending round is discarded without being scored.
    pub fn on_session_timeout(&mut self) -> Option<SessionSummary> {
        if !self.is_active() {
            return None;
        }

        self.cancel_timers();
        if let Some(round) = self.current.take() {
            debug!(index = round.index(), "pending round discarded at session end");
        }
        self.phase = Phase::Ended;

        let summary = self.summary();
        info!(
            score = summary.score,
            level = summary.level,
            accuracy = summary.accuracy,
            "session ended"
        );
        self.emit_stats();
        self.sink.emit(SessionEvent::Ended(summary.clone()));
        Some(summary)
    }

    /// Recomputes elapsed time from the clock and ends the session when due.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.tick_at(now);
    }

    fn tick_at(&mut self, at: Instant) {
        if !self.is_active() {
            return;
        }
        let Some(started_at) = self.started_at else {
            return;
        };

        let elapsed = at.saturating_duration_since(started_at);
        self.elapsed_secs = self.elapsed_secs.max(elapsed.as_secs());

        if elapsed >= self.config.duration {
            self.on_session_timeout();
        } else {
            self.emit_stats();
        }
    }

    /// Fires every due timer in deadline order; returns how many fired.
    ///
    /// Each timer is handled at the instant it was due, not at the time of
    /// the poll, so a late poll replays the timeline: rounds that expired
    /// along the way time out before a later session end.
    pub fn poll(&mut self) -> usize {
        let mut fired = 0;
        while let Some((kind, handle)) = self.next_due() {
            let now = self.clock.now();
            let at = handle.due();
            match kind {
                TimerKind::Tick => {
                    if !self.tick_timer.fire(handle, now) {
                        break;
                    }
                    if let Some(end) = self.ends_at() {
                        self.tick_timer.arm((at + self.config.tick_interval).min(end));
                    }
                    self.tick_at(at);
                }
                TimerKind::Round => {
                    if !self.round_timer.fire(handle, now) {
                        break;
                    }
                    self.time_out_round(at);
                }
                TimerKind::Feedback => {
                    if !self.feedback_timer.fire(handle, now) {
                        break;
                    }
                    if self.phase == Phase::ShowingFeedback {
                        self.begin_round(at);
                        self.emit_stats();
                    }
                }
            }
            fired += 1;
        }
        fired
    }

    fn ends_at(&self) -> Option<Instant> {
        self.started_at.map(|s| s + self.config.duration)
    }

    fn next_due(&self) -> Option<(TimerKind, TimerHandle)> {
        let now = self.clock.now();
        [
            (TimerKind::Tick, &self.tick_timer),
            (TimerKind::Round, &self.round_timer),
            (TimerKind::Feedback, &self.feedback_timer),
        ]
        .into_iter()
        .filter_map(|(kind, slot)| slot.handle().map(|h| (kind, h)))
        .filter(|(_, h)| h.due() <= now)
        .min_by_key(|(kind, h)| (h.due(), *kind))
    }

    fn begin_round(&mut self, now: Instant) {
        let ctx = RoundContext {
            index: self.rounds_started,
            level: self.difficulty.level(),
            difficulty: &self.difficulty,
        };
        let challenge = self.generator.next_round(&ctx);
        let budget = self
            .config
            .round_time
            .and_then(|p| self.difficulty.param(p))
            .map(Duration::from_millis);

        let round = Round::new(self.rounds_started, challenge, now, budget);
        match round.deadline() {
            Some(deadline) => {
                self.round_timer.arm(deadline);
            }
            None => {
                self.round_timer.cancel();
            }
        }
        self.rounds_started += 1;
        self.phase = Phase::AwaitingInput;

        debug!(index = round.index(), ?budget, prompt = ?round.prompt(), "round started");
        self.sink.emit(SessionEvent::RoundStarted {
            index: round.index(),
            prompt: round.prompt().clone(),
            budget,
            level: self.difficulty.level(),
        });
        self.current = Some(round);
    }

    fn resolve(
        &mut self,
        outcome: RoundOutcome,
        base_override: Option<u64>,
        window: TimeWindow,
        now: Instant,
    ) -> Resolution {
        self.round_timer.cancel();
        let level = self.difficulty.level();

        self.total_count += 1;
        let points = if outcome.is_correct() {
            self.correct_count += 1;
            self.config
                .reward
                .reward(level, window, &self.difficulty, base_override)
        } else {
            0
        };
        self.score += points;
        let level_up = self.difficulty.on_round_resolved(outcome.is_correct());

        let index = match self.current.take() {
            Some(mut round) => {
                round.resolve(outcome);
                round.index()
            }
            None => self.rounds_started.saturating_sub(1),
        };
        self.phase = Phase::ShowingFeedback;
        self.feedback_timer.arm(now + self.config.feedback_delay);

        debug!(index, %outcome, points, score = self.score, "round resolved");
        self.sink.emit(SessionEvent::RoundResolved {
            index,
            outcome,
            points,
        });
        if let Some(up) = &level_up {
            info!(level = up.level, "level up");
            self.sink.emit(SessionEvent::LevelUp(up.clone()));
        }
        self.emit_stats();

        Resolution {
            index,
            outcome,
            points,
            level_up,
        }
    }

    fn time_window(&self, round: &Round<G::Prompt, G::Answer>, now: Instant) -> TimeWindow {
        let elapsed = self
            .started_at
            .map(|s| now.saturating_duration_since(s))
            .unwrap_or_default();
        let window = match (round.budget(), round.remaining(now)) {
            (Some(budget), Some(remaining)) => TimeWindow::new(remaining, budget),
            _ => TimeWindow::new(
                self.config.duration.saturating_sub(elapsed),
                self.config.duration,
            ),
        };
        window.with_session_elapsed(elapsed)
    }

    fn cancel_timers(&mut self) {
        self.round_timer.cancel();
        self.feedback_timer.cancel();
        self.tick_timer.cancel();
    }

    fn emit_stats(&mut self) {
        let stats = self.stats();
        self.sink.emit(SessionEvent::Stats(stats));
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        debug!(operation, phase = %self.phase, "rejected");
        SessionError::InvalidState {
            operation,
            phase: self.phase,
        }
    }
}
