//! Error types
//!
//! Construction failures are surfaced to the caller; the simulation itself
//! has no error path (every physics query is total).

use thiserror::Error;

/// A level plan that cannot be turned into a `Level`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("level plan has no rows")]
    Empty,
    #[error("row {row} is {actual} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("level plan has no player spawn ('@')")]
    MissingPlayer,
    #[error("level plan has {count} player spawns, expected exactly one")]
    MultiplePlayers { count: usize },
    #[error("unknown tile {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
}

/// Invalid movement tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning field `{field}` {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
