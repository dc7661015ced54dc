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

const INITIAL_GRID: u64 = 2;
const MAX_GRID: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Diamond];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub shape: Shape,
    pub filled: bool,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match (self.shape, self.filled) {
            (Shape::Circle, true) => '●',
            (Shape::Circle, false) => '○',
            (Shape::Square, true) => '■',
            (Shape::Square, false) => '□',
            (Shape::Triangle, true) => '▲',
            (Shape::Triangle, false) => '△',
            (Shape::Diamond, true) => '◆',
            (Shape::Diamond, false) => '◇',
        };
        write!(f, "{glyph}")
    }
}

/// A square grid of identical items except one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub grid: usize,
    pub items: Vec<Item>,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, items) in self.items.chunks(self.grid.max(1)).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (col, item) in items.iter().enumerate() {
                let cell = row * self.grid + col + 1;
                if col > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{cell:>2}:{item}")?;
            }
        }
        Ok(())
    }
}

/// Visual search for the odd one out
#[derive(Debug)]
pub struct SpatialSpeed {
    rng: StdRng,
}

impl Default for SpatialSpeed {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl SpatialSpeed {
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    fn odd_one(&mut self, common: Item) -> Item {
        if self.rng.gen_bool(0.5) {
            Item {
                filled: !common.filled,
                ..common
            }
        } else {
            let others: Vec<Shape> = Shape::ALL
                .into_iter()
                .filter(|&s| s != common.shape)
                .collect();
            Item {
                shape: *others.choose(&mut self.rng).unwrap_or(&common.shape),
                ..common
            }
        }
    }
}

impl RoundGenerator for SpatialSpeed {
    type Prompt = Board;
    type Answer = usize;

    fn next_round(&mut self, ctx: &RoundContext<'_>) -> Challenge<Board, usize> {
        let grid = usize::try_from(ctx.param_or(Param::GridSize, INITIAL_GRID)).unwrap_or(2);
        let total = grid * grid;
        let common = Item {
            shape: *Shape::ALL.choose(&mut self.rng).unwrap_or(&Shape::Circle),
            filled: self.rng.gen_bool(0.5),
        };
        let odd = self.rng.gen_range(0..total);

        let mut items = vec![common; total];
        items[odd] = self.odd_one(common);
        Challenge::new(Board { grid, items }, odd + 1)
    }

    fn progress_label(&self, ctx: &ProgressContext<'_>) -> String {
        let grid = ctx.difficulty.param(Param::GridSize).unwrap_or(INITIAL_GRID);
        format!("{}% accuracy - {grid}x{grid}", ctx.accuracy)
    }
}

impl Game for SpatialSpeed {
    fn kind(&self) -> GameKind {
        GameKind::SpatialSpeed
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: Duration::from_millis(1500),
            round_time: Some(Param::RoundTimeMs),
            reward: RewardFormula {
                base: BasePoints::Fixed(10),
                time_bonus: TimeBonus::Fraction { scale: 10 },
                level_multiplier: 5,
            },
            trigger: LevelUpTrigger::Streak(3),
            rules: vec![
                DifficultyRule::decreasing(Param::RoundTimeMs, 5000, 500, 2000),
                DifficultyRule::increasing(Param::GridSize, INITIAL_GRID, 1, MAX_GRID).every(2),
            ],
            ..SessionConfig::default()
        }
    }

    fn parse_answer(&self, input: &str) -> Option<usize> {
        input.parse().ok().filter(|&n| n >= 1)
    }

    fn answer_hint(&self) -> &'static str {
        "number of the cell that differs"
    }
}
