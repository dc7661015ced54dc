// Invariants over arbitrary sequences of round outcomes.

use std::time::Duration;

use proptest::prelude::*;

use brainboost::clock::ManualClock;
use brainboost::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use brainboost::round::{Challenge, RoundContext, RoundGenerator, RoundOutcome};
use brainboost::scoring::{BasePoints, RewardFormula, TimeBonus};
use brainboost::session::{Phase, Session, SessionConfig, SessionEvent};

#[derive(Default)]
struct Counter;

impl RoundGenerator for Counter {
    type Prompt = u32;
    type Answer = u32;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<u32, u32> {
        Challenge::new(ctx.index, ctx.index)
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Correct,
    Wrong,
    Timeout,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Correct), Just(Action::Wrong), Just(Action::Timeout)]
}

fn config(trigger: LevelUpTrigger) -> SessionConfig {
    SessionConfig {
        duration: Duration::from_secs(3600),
        feedback_delay: Duration::from_millis(100),
        round_time: Some(Param::RoundTimeMs),
        reward: RewardFormula {
            base: BasePoints::Fixed(10),
            time_bonus: TimeBonus::RemainingMillis { per_point: 100 },
            level_multiplier: 2,
        },
        trigger,
        rules: vec![
            DifficultyRule::decreasing(Param::RoundTimeMs, 2000, 250, 500),
            DifficultyRule::increasing(Param::DataSize, 3, 1, 6).every(2),
        ],
        ..SessionConfig::default()
    }
}

fn last_resolved(events: &[SessionEvent<u32>]) -> Option<RoundOutcome> {
    events.iter().rev().find_map(|e| match e {
        SessionEvent::RoundResolved { outcome, .. } => Some(*outcome),
        _ => None,
    })
}

fn trigger() -> impl Strategy<Value = LevelUpTrigger> {
    prop_oneof![
        (1u32..6).prop_map(LevelUpTrigger::Streak),
        (1u32..6).prop_map(LevelUpTrigger::Cumulative),
    ]
}

proptest! {
    #[test]
    fn test_counters_and_params_stay_in_range(
        trigger in trigger(),
        actions in prop::collection::vec(action(), 0..40),
    ) {
        let clock = ManualClock::new();
        let mut s = Session::new(config(trigger), Counter, clock.clone(), Vec::new()).unwrap();
        s.start().unwrap();

        let mut last_level = s.level();
        let mut last_score = s.score();
        for (n, action) in actions.iter().enumerate() {
            prop_assert_eq!(s.phase(), Phase::AwaitingInput);
            let round = s.current_round().unwrap();
            let expected = round.expected()[0];
            let budget = round.budget().unwrap();

            let outcome = match action {
                Action::Correct => s.submit_answer(expected).unwrap().outcome,
                Action::Wrong => s.submit_answer(expected + 1).unwrap().outcome,
                Action::Timeout => {
                    clock.advance(budget);
                    s.poll();
                    last_resolved(s.sink()).unwrap()
                }
            };
            prop_assert!(outcome.is_resolved());
            if !matches!(action, Action::Correct) {
                prop_assert_ne!(outcome, RoundOutcome::Correct);
                prop_assert_eq!(s.score(), last_score);
            }
            if matches!(trigger, LevelUpTrigger::Streak(_)) && outcome != RoundOutcome::Correct {
                prop_assert_eq!(s.consecutive_correct(), 0);
            }

            prop_assert_eq!(s.total_count() as usize, n + 1);
            prop_assert!(s.correct_count() <= s.total_count());
            prop_assert!(s.accuracy() <= 100);
            prop_assert!(s.level() >= last_level);
            prop_assert!(s.score() >= last_score);

            let round_time = s.param(Param::RoundTimeMs).unwrap();
            prop_assert!((500..=2000).contains(&round_time));
            let size = s.param(Param::DataSize).unwrap();
            prop_assert!((3..=6).contains(&size));

            last_level = s.level();
            last_score = s.score();
            clock.advance_ms(100);
            s.poll();
        }
    }
}
