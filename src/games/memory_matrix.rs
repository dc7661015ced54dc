use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::fmt;
use std::time::Duration;

use super::{Game, GameKind};
use crate::difficulty::{DifficultyRule, LevelUpTrigger, Param};
use crate::round::{Challenge, ProgressContext, RoundContext, RoundGenerator};
use crate::scoring::{BasePoints, RewardFormula, TimeBonus};
use crate::session::SessionConfig;

const GRID_SIZE: usize = 4;
const INITIAL_CELLS: u64 = 3;
const MAX_CELLS: u64 = 12;
const MS_PER_CELL: u64 = 1000;
const REVEAL_PAUSE_MS: u64 = 500;

/// Cells lit one after another on a square grid, numbered from 1 row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub grid: usize,
    pub sequence: Vec<usize>,
}

impl Pattern {
    /// Position of `cell` in the lighting order, from 1
    pub fn step_of(&self, cell: usize) -> Option<usize> {
        self.sequence.iter().position(|&c| c == cell).map(|i| i + 1)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.grid {
                let cell = row * self.grid + col + 1;
                if col > 0 {
                    write!(f, " ")?;
                }
                if let Some(step) = self.step_of(cell) {
                    write!(f, "({step:>2})")?;
                } else {
                    write!(f, "  · ")?;
                }
            }
        }
        Ok(())
    }
}

/// Visual memory: recall the lit cells in the order they lit up
#[derive(Debug)]
pub struct MemoryMatrix {
    rng: StdRng,
}

impl Default for MemoryMatrix {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl MemoryMatrix {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl RoundGenerator for MemoryMatrix {
    type Prompt = Pattern;
    type Answer = Vec<usize>;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Pattern, Vec<usize>> {
        let total = GRID_SIZE * GRID_SIZE;
        let cells = usize::try_from(ctx.param_or(Param::DataSize, INITIAL_CELLS))
            .unwrap_or(total)
            .min(total);
        let sequence: Vec<usize> = index::sample(&mut self.rng, total, cells)
            .into_iter()
            .map(|i| i + 1)
            .collect();
        Challenge::new(
            Pattern {
                grid: GRID_SIZE,
                sequence: sequence.clone(),
            },
            sequence,
        )
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        let cells = ctx.difficulty.param(Param::DataSize).unwrap_or(INITIAL_CELLS);
        format!("{cells} cells")
    }
}

impl Game for MemoryMatrix {
    fn kind(&self) -> GameKind {
        GameKind::MemoryMatrix
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
                time_bonus: TimeBonus::ElapsedDecay {
                    start: 10,
                    secs_per_point: 2,
                },
                level_multiplier: 5,
            },
            trigger: LevelUpTrigger::Streak(1),
            rules: vec![
                DifficultyRule::increasing(Param::DataSize, INITIAL_CELLS, 1, MAX_CELLS).every(2),
            ],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<Vec<usize>> {
        let total = GRID_SIZE * GRID_SIZE;
        let cells: Option<Vec<usize>> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>().ok().filter(|n| (1..=total).contains(n)))
            .collect();
        cells.filter(|c| !c.is_empty())
    }

    fn answer_hint(&self) -> &'static str {
        "list the lit cells in order, numbered 1-16 row by row"
    }

    fn reveal_time(&self, prompt: &Pattern) -> Option<Duration> {
        Some(Duration::from_millis(
            MS_PER_CELL * prompt.sequence.len() as u64 + REVEAL_PAUSE_MS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyController;
    use crate::round::Verdict;

    fn controller() -> DifficultyController {
        let config = MemoryMatrix::default().session_config();
        DifficultyController::new(config.trigger, config.rules).unwrap()
    }

    fn first_round(seed: u64) -> (MemoryMatrix, Challenge<Pattern, Vec<usize>>) {
        let mut game = MemoryMatrix::with_rng(StdRng::seed_from_u64(seed));
        let dc = controller();
        let round = game.next_round(&RoundContext {
            index: 0,
            level: 1,
            difficulty: &dc,
        });
        (game, round)
    }

    fn typed(cells: &[usize]) -> String {
        cells.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
    }

    #[test]
    fn test_lit_cells_are_unique_and_on_the_grid() {
        let mut game = MemoryMatrix::with_rng(StdRng::seed_from_u64(12));
        let mut dc = controller();
        for _ in 0..30 {
            dc.level_up();
        }

        let round = game.next_round(&RoundContext {
            index: 0,
            level: dc.level(),
            difficulty: &dc,
        });
        let mut cells = round.prompt.sequence.clone();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), 12);
        assert!(cells.iter().all(|c| (1..=16).contains(c)));
    }

    #[test]
    fn test_cells_recalled_in_lighting_order_are_correct() {
        let (mut game, round) = first_round(1);
        let answer = game.parse_answer(&typed(&round.prompt.sequence)).unwrap();
        assert_eq!(game.judge(&round, &answer), Verdict::Correct);
    }

    #[test]
    fn test_reversed_recall_is_incorrect() {
        let (mut game, round) = first_round(1);
        let mut cells = round.prompt.sequence.clone();
        cells.reverse();
        assert_ne!(cells, round.prompt.sequence);

        let answer = game.parse_answer(&typed(&cells)).unwrap();
        assert_eq!(game.judge(&round, &answer), Verdict::Incorrect);
    }

    #[test]
    fn test_missing_or_extra_cells_are_incorrect() {
        let mut game = MemoryMatrix::default();
        let challenge = Challenge::new(
            Pattern {
                grid: 4,
                sequence: vec![11, 2, 7],
            },
            vec![11, 2, 7],
        );
        assert_eq!(game.judge(&challenge, &vec![11, 2]), Verdict::Incorrect);
        assert_eq!(game.judge(&challenge, &vec![11, 2, 7, 12]), Verdict::Incorrect);
        assert_eq!(game.judge(&challenge, &vec![2, 7, 11]), Verdict::Incorrect);
    }

    #[test]
    fn test_parse_keeps_typed_order() {
        let game = MemoryMatrix::default();
        assert_eq!(game.parse_answer("16 3,9"), Some(vec![16, 3, 9]));
    }

    #[test]
    fn test_rejects_cells_off_the_grid() {
        let game = MemoryMatrix::default();
        assert_eq!(game.parse_answer("1 17"), None);
        assert_eq!(game.parse_answer("0"), None);
        assert_eq!(game.parse_answer(""), None);
    }

    #[test]
    fn test_reveal_time_grows_with_sequence() {
        let game = MemoryMatrix::default();
        let pattern = Pattern {
            grid: 4,
            sequence: vec![5, 1, 9],
        };
        assert_eq!(game.reveal_time(&pattern), Some(Duration::from_millis(3_500)));
    }

    #[test]
    fn test_renders_lighting_order() {
        let pattern = Pattern {
            grid: 2,
            sequence: vec![4, 1],
        };
        assert_eq!(pattern.to_string(), "( 2)   · \n  ·  ( 1)");
    }
}
