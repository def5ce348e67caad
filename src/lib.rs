//! Puppy Quest - a tile-grid platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, actors, player controller, level, generator)
//! - `tuning`: Data-driven movement balance
//! - `error`: Plan construction and tuning errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{PlanError, TuningError};
pub use tuning::Tuning;

/// 2D point/extent/velocity in grid units (`+` adds, `* f64` scales)
pub type Vector = glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Largest physics substep (seconds). Keeps per-step displacement under one cell.
    pub const MAX_STEP: f64 = 0.05;
    /// Grace period after won/lost before the level reports finished
    pub const FINISH_DELAY: f64 = 1.0;
    /// Seconds without a pickup before the combo resets
    pub const COMBO_DECAY: f64 = 2.0;

    /// Score for a collected bone (multiplied by the combo, capped at 10)
    pub const BONE_SCORE: u64 = 100;
    /// Score for a `?` block smashed by a dash
    pub const BLOCK_SCORE: u64 = 50;
    /// Score for stomping a patrol
    pub const STOMP_SCORE: u64 = 200;
    /// Par time (seconds) for the completion time bonus
    pub const PAR_TIME: f64 = 60.0;
    /// Completion bonus per combo step at the moment of winning
    pub const COMBO_BONUS: u64 = 10;

    /// Generated level height (rows)
    pub const GEN_HEIGHT: usize = 20;
    /// Generated level width at difficulty 0
    pub const GEN_BASE_WIDTH: usize = 50;
    /// Extra generated columns per difficulty step
    pub const GEN_WIDTH_PER_DIFFICULTY: usize = 5;
    /// Highest generator difficulty
    pub const MAX_DIFFICULTY: u32 = 10;

    /// Starting lives for a fresh run
    pub const START_LIVES: u32 = 5;
}
