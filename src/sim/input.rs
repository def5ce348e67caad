//! Per-frame control snapshot
//!
//! The simulation only sees the held state of four controls. Edge
//! detection (jump presses, dash presses) happens inside the controller.

use serde::{Deserialize, Serialize};

/// Controls held during one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    /// Jump
    pub up: bool,
    /// Dash
    pub shift: bool,
}

impl InputState {
    /// Net horizontal intent: -1, 0 or 1
    pub fn horizontal(&self) -> f64 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}
