use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::difficulty::{DifficultyController, Param};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum RoundOutcome {
    Pending,
    Correct,
    Incorrect,
    TimedOut,
}

impl RoundOutcome {
    pub fn is_resolved(&self) -> bool {
        *self != RoundOutcome::Pending
    }

    pub fn is_correct(&self) -> bool {
        *self == RoundOutcome::Correct
    }
}

/// A generated prompt and the answers that will be accepted for it
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge<P, A> {
    pub prompt: P,
    pub expected: Vec<A>,
}

impl<P, A> Challenge<P, A> {
    pub fn new(prompt: P, expected: A) -> Self {
        Self {
            prompt,
            expected: vec![expected],
        }
    }

    /// A challenge judged entirely by the generator (no fixed answer list)
    pub fn open(prompt: P) -> Self {
        Self {
            prompt,
            expected: Vec::new(),
        }
    }
}

/// A generator's judgement of one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// Correct, scored from this base instead of the formula's
    CorrectWithBase(u64),
    Incorrect,
}

/// What a generator may look at when building the next round
#[derive(Debug, Clone, Copy)]
pub struct RoundContext<'a> {
    pub index: u32,
    pub level: u32,
    pub difficulty: &'a DifficultyController,
}

impl RoundContext<'_> {
    pub fn param(&self, param: Param) -> Option<u64> {
        self.difficulty.param(param)
    }

    pub fn param_or(&self, param: Param, default: u64) -> u64 {
        self.param(param).unwrap_or(default)
    }
}

/// What a generator may look at when labelling progress
#[derive(Debug, Clone, Copy)]
pub struct ProgressContext<'a> {
    pub level: u32,
    pub accuracy: u32,
    pub correct_count: u32,
    pub total_count: u32,
    pub difficulty: &'a DifficultyController,
}

/// Per-game strategy producing challenges and judging answers
pub trait RoundGenerator {
    type Prompt: Clone + fmt::Debug;
    type Answer: Clone + PartialEq + fmt::Debug;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Self::Prompt, Self::Answer>;

    fn judge(
        &mut self,
        challenge: &Challenge<Self::Prompt, Self::Answer>,
        answer: &Self::Answer,
    ) -> Verdict {
        if challenge.expected.contains(answer) {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        format!("{}% accuracy", ctx.accuracy)
    }

    /// Forget per-session state; called on every `start()`
    fn reset(&mut self) {}
}

/// One challenge/response cycle
#[derive(Debug, Clone)]
pub struct Round<P, A> {
    index: u32,
    challenge: Challenge<P, A>,
    started_at: Instant,
    budget: Option<Duration>,
    outcome: RoundOutcome,
}

impl<P, A> Round<P, A> {
    pub fn new(
        index: u32,
        challenge: Challenge<P, A>,
        started_at: Instant,
        budget: Option<Duration>,
    ) -> Self {
        Self {
            index,
            challenge,
            started_at,
            budget,
            outcome: RoundOutcome::Pending,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn prompt(&self) -> &P {
        &self.challenge.prompt
    }

    pub fn expected(&self) -> &[A] {
        &self.challenge.expected
    }

    pub fn challenge(&self) -> &Challenge<P, A> {
        &self.challenge
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.budget.map(|b| self.started_at + b)
    }

    pub fn outcome(&self) -> RoundOutcome {
        self.outcome
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline().map(|d| d.saturating_duration_since(now))
    }

    /// Sets the terminal outcome; only the first resolution sticks.
    pub fn resolve(&mut self, outcome: RoundOutcome) -> bool {
        if self.outcome.is_resolved() || !outcome.is_resolved() {
            return false;
        }
        self.outcome = outcome;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_resolution_wins() {
        let mut round = Round::new(0, Challenge::new("2 + 2", 4), Instant::now(), None);
        assert_eq!(round.outcome(), RoundOutcome::Pending);

        assert!(round.resolve(RoundOutcome::TimedOut));
        assert!(!round.resolve(RoundOutcome::Correct));
        assert_eq!(round.outcome(), RoundOutcome::TimedOut);
    }

    #[test]
    fn test_pending_is_not_a_resolution() {
        let mut round = Round::new(0, Challenge::new('a', 'a'), Instant::now(), None);
        assert!(!round.resolve(RoundOutcome::Pending));
    }

    #[test]
    fn test_deadline_follows_budget() {
        let start = Instant::now();
        let round = Round::new(
            3,
            Challenge::new((), true),
            start,
            Some(Duration::from_millis(1000)),
        );
        assert_eq!(round.deadline(), Some(start + Duration::from_millis(1000)));
        assert_eq!(
            round.remaining(start + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            round.remaining(start + Duration::from_secs(3)),
            Some(Duration::ZERO)
        );

        let open = Round::new(0, Challenge::<(), bool>::open(()), start, None);
        assert!(open.deadline().is_none());
        assert!(open.expected().is_empty());
    }
}
