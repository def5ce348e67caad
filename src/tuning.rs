//! Movement and pickup tuning
//!
//! Every feel constant of the player controller lives here so balance can be
//! adjusted from JSON without touching the simulation. Missing fields take
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_STEP;
use crate::error::TuningError;
use crate::sim::actor::{PLAYER_HEIGHT, PLAYER_WIDTH};

/// Player controller and pickup balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Horizontal ===
    /// Acceleration while grounded (units/s²)
    pub run_accel: f64,
    /// Deceleration while grounded with no input
    pub run_decel: f64,
    /// Acceleration while airborne
    pub air_accel: f64,
    /// Deceleration while airborne with no input
    pub air_decel: f64,
    /// Acceleration multiplier when pushing against current momentum
    pub turn_multiplier: f64,
    /// Horizontal speeds below this snap to zero when coasting
    pub stop_threshold: f64,
    /// Max horizontal speed
    pub max_speed: f64,
    /// Max horizontal speed while a speed boost is active
    pub boost_max_speed: f64,

    // === Vertical ===
    pub gravity: f64,
    /// Cap on vertical speed in either direction
    pub terminal_velocity: f64,
    pub jump_speed: f64,
    /// Grace window after leaving a ledge
    pub coyote_time: f64,
    /// How long an early jump press is remembered
    pub jump_buffer: f64,

    // === Walls ===
    /// Max descent speed while wall sliding
    pub wall_slide_speed: f64,
    /// Gravity multiplier while wall sliding
    pub wall_slide_gravity_scale: f64,
    /// Longest continuous wall slide
    pub wall_slide_duration: f64,
    /// Horizontal launch speed away from the wall
    pub wall_jump_x_speed: f64,
    /// Wall jump height as a fraction of `jump_speed`
    pub wall_jump_y_scale: f64,
    pub wall_jump_cooldown: f64,

    // === Dash ===
    pub dash_speed: f64,
    pub dash_duration: f64,
    pub dash_cooldown: f64,

    // === Interactions ===
    /// Upward launch speed from a spring
    pub spring_speed: f64,
    /// Upward bounce after stomping a patrol
    pub stomp_bounce: f64,
    /// Upward speed of a shield-absorbed hit
    pub knockback_speed: f64,
    /// Damage immunity after a shield absorbs a hit
    pub invulnerability: f64,
    pub speed_boost_duration: f64,
    pub shield_duration: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            run_accel: 60.0,
            run_decel: 40.0,
            air_accel: 20.0,
            air_decel: 10.0,
            turn_multiplier: 3.0,
            stop_threshold: 0.1,
            max_speed: 10.0,
            boost_max_speed: 15.0,

            gravity: 40.0,
            terminal_velocity: 35.0,
            jump_speed: 20.0,
            coyote_time: 0.1,
            jump_buffer: 0.1,

            wall_slide_speed: 3.0,
            wall_slide_gravity_scale: 0.3,
            wall_slide_duration: 0.5,
            wall_jump_x_speed: 12.0,
            wall_jump_y_scale: 0.9,
            wall_jump_cooldown: 0.2,

            dash_speed: 15.0,
            dash_duration: 0.2,
            dash_cooldown: 1.0,

            spring_speed: 25.0,
            stomp_bounce: 15.0,
            knockback_speed: 15.0,
            invulnerability: 0.5,
            speed_boost_duration: 5.0,
            shield_duration: 8.0,
        }
    }
}

impl Tuning {
    /// Parse (possibly partial) JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check the relationships the controller depends on
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("run_accel", self.run_accel),
            ("air_accel", self.air_accel),
            ("max_speed", self.max_speed),
            ("gravity", self.gravity),
            ("terminal_velocity", self.terminal_velocity),
            ("jump_speed", self.jump_speed),
            ("dash_speed", self.dash_speed),
            ("dash_duration", self.dash_duration),
            ("spring_speed", self.spring_speed),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be positive",
                });
            }
        }

        let non_negative = [
            ("run_decel", self.run_decel),
            ("air_decel", self.air_decel),
            ("stop_threshold", self.stop_threshold),
            ("coyote_time", self.coyote_time),
            ("jump_buffer", self.jump_buffer),
            ("wall_slide_speed", self.wall_slide_speed),
            ("wall_slide_gravity_scale", self.wall_slide_gravity_scale),
            ("wall_slide_duration", self.wall_slide_duration),
            ("wall_jump_cooldown", self.wall_jump_cooldown),
            ("dash_cooldown", self.dash_cooldown),
            ("invulnerability", self.invulnerability),
            ("speed_boost_duration", self.speed_boost_duration),
            ("shield_duration", self.shield_duration),
        ];
        for (field, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        if self.turn_multiplier < 1.0 {
            return Err(TuningError::Invalid {
                field: "turn_multiplier",
                reason: "must be at least 1",
            });
        }
        if self.boost_max_speed < self.max_speed {
            return Err(TuningError::Invalid {
                field: "boost_max_speed",
                reason: "must not be below max_speed",
            });
        }

        // A body must never cover more than its own extent plus one cell per
        // substep, otherwise it can hop over a one-cell wall.
        let fastest_x = self
            .dash_speed
            .max(self.boost_max_speed)
            .max(self.wall_jump_x_speed);
        if fastest_x * MAX_STEP >= PLAYER_WIDTH + 1.0 {
            return Err(TuningError::Invalid {
                field: "dash_speed",
                reason: "moves further than one cell per substep",
            });
        }
        if self.terminal_velocity * MAX_STEP >= PLAYER_HEIGHT + 1.0 {
            return Err(TuningError::Invalid {
                field: "terminal_velocity",
                reason: "moves further than one cell per substep",
            });
        }

        Ok(())
    }

    /// Max horizontal speed for the current boost state
    pub fn max_speed_for(&self, boosted: bool) -> f64 {
        if boosted {
            self.boost_max_speed
        } else {
            self.max_speed
        }
    }
}
