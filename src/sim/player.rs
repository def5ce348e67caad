//! Player movement controller
//!
//! The player is always in one dominant mode (dashing, wall sliding,
//! grounded or airborne), tracked through the flags and timers of
//! `PlayerState`. Every motion is proposed, checked against the grid and
//! committed only when the target box is free. Terrain contacts are
//! recorded for the level to resolve once the player has finished its step.

use serde::{Deserialize, Serialize};

use super::actor::{ActContext, Body};
use super::events::{ParticleBurst, SoundCue};
use super::grid::CellKind;
use crate::Vector;
use crate::tuning::Tuning;

const DASH_START: ParticleBurst = ParticleBurst::new(30, 0xff00ff, 6.0, 0.8).sizes(3.0, 10.0);
const DASH_TRAIL: ParticleBurst = ParticleBurst::new(5, 0x00ffff, 3.0, 0.4).sizes(2.0, 5.0);
const LAND_DUST: ParticleBurst = ParticleBurst::new(10, 0xffffff, 4.0, 0.3)
    .sizes(2.0, 5.0)
    .gravity(5.0);
const JUMP_PUFF: ParticleBurst = ParticleBurst::new(15, 0x00ffff, 5.0, 0.6)
    .sizes(3.0, 7.0)
    .gravity(10.0);
const DOUBLE_JUMP_RING: ParticleBurst = ParticleBurst::new(25, 0xff00ff, 6.0, 0.7)
    .sizes(4.0, 9.0)
    .gravity(5.0);
const WALL_SPARKS: ParticleBurst = ParticleBurst::new(2, 0xff00ff, 2.0, 0.4)
    .sizes(2.0, 4.0)
    .gravity(10.0);
const WALL_KICK: ParticleBurst = ParticleBurst::new(20, 0x00ffff, 6.0, 0.6)
    .sizes(3.0, 8.0)
    .gravity(5.0);

/// A blocked move against the terrain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub kind: CellKind,
    /// The rejected position
    pub pos: Vector,
    pub size: Vector,
    /// Whether the move was part of a dash
    pub dashing: bool,
}

/// Result of a lethal contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Still invulnerable from an earlier hit
    Ignored,
    /// Shield consumed
    Absorbed,
    Lethal,
}

/// Dominant movement mode for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    Dashing,
    WallSliding,
    Grounded,
    Airborne,
}

/// Controller flags and timers. All timers count down to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub grounded: bool,
    /// Grace window after walking off a ledge
    pub coyote_timer: f64,
    /// Remembered jump press
    pub jump_buffer_timer: f64,
    /// Jump held on the previous step
    pub was_up: bool,
    pub can_double_jump: bool,

    pub dashing: bool,
    pub dash_timer: f64,
    pub dash_cooldown: f64,
    /// Last faced direction, -1 or 1
    pub last_dir: f64,

    pub wall_sliding: bool,
    /// Side of the wall being slid on, -1 or 1
    pub wall_dir: f64,
    pub wall_slide_timer: f64,
    /// Slide ran out; no new slide until landing, wall jumping or leaving the wall
    pub wall_slide_spent: bool,
    pub wall_jump_cooldown: f64,
    wall_slide_cue_played: bool,

    /// Current ascent came from a jump and may still be cut short
    pub jump_cut_armed: bool,

    pub speed_boost_timer: f64,
    pub shield_timer: f64,
    pub invulnerable_timer: f64,

    /// Bottom edge at the start of the latest step, `None` before the first
    pub prev_bottom: Option<f64>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            grounded: false,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            was_up: false,
            can_double_jump: false,
            dashing: false,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            last_dir: 1.0,
            wall_sliding: false,
            wall_dir: 0.0,
            wall_slide_timer: 0.0,
            wall_slide_spent: false,
            wall_jump_cooldown: 0.0,
            wall_slide_cue_played: false,
            jump_cut_armed: false,
            speed_boost_timer: 0.0,
            shield_timer: 0.0,
            invulnerable_timer: 0.0,
            prev_bottom: None,
        }
    }
}

impl PlayerState {
    pub fn mode(&self) -> MovementMode {
        if self.dashing {
            MovementMode::Dashing
        } else if self.wall_sliding {
            MovementMode::WallSliding
        } else if self.grounded {
            MovementMode::Grounded
        } else {
            MovementMode::Airborne
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    pub fn is_wall_sliding(&self) -> bool {
        self.wall_sliding
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn has_shield(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub fn is_boosted(&self) -> bool {
        self.speed_boost_timer > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// Launch upward from an external source (spring, stomp). Not a jump:
    /// releasing the jump button does not cut it.
    pub fn launch(&mut self, body: &mut Body, speed: f64) {
        body.speed.y = -speed;
        self.jump_cut_armed = false;
        self.coyote_timer = 0.0;
        self.grounded = false;
        self.wall_sliding = false;
    }

    /// Resolve a lethal hit. An active shield is consumed and knocks the
    /// player up and away from where they are facing, followed by a short
    /// invulnerability window during which further hits are ignored.
    pub fn take_hit(&mut self, body: &mut Body, tuning: &Tuning) -> HitOutcome {
        if self.is_invulnerable() {
            return HitOutcome::Ignored;
        }
        if !self.has_shield() {
            return HitOutcome::Lethal;
        }
        self.shield_timer = 0.0;
        self.invulnerable_timer = tuning.invulnerability;
        self.dashing = false;
        self.dash_timer = 0.0;
        body.speed = Vector::new(
            -self.last_dir * tuning.knockback_speed * 0.5,
            -tuning.knockback_speed,
        );
        self.jump_cut_armed = false;
        self.grounded = false;
        self.wall_sliding = false;
        HitOutcome::Absorbed
    }
}

fn tick(timer: &mut f64, dt: f64) {
    if *timer > 0.0 {
        *timer = (*timer - dt).max(0.0);
    }
}

/// Advance the player by one substep
pub fn act(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>) {
    let dt = ctx.dt;
    state.prev_bottom = Some(body.bottom());
    tick(&mut state.speed_boost_timer, dt);
    tick(&mut state.shield_timer, dt);
    tick(&mut state.invulnerable_timer, dt);
    tick(&mut state.dash_cooldown, dt);
    tick(&mut state.wall_jump_cooldown, dt);

    if state.dashing {
        state.dash_timer -= dt;
        if state.dash_timer <= 0.0 {
            state.dashing = false;
            state.dash_timer = 0.0;
            body.speed.x = 0.0;
        } else {
            dash_step(body, state, ctx);
            state.was_up = ctx.input.up;
            return;
        }
    }

    if ctx.input.shift && state.dash_cooldown <= 0.0 {
        start_dash(body, state, ctx);
        state.was_up = ctx.input.up;
        return;
    }

    move_x(body, state, ctx);
    move_y(body, state, ctx);
    state.was_up = ctx.input.up;
}

fn start_dash(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>) {
    let dir = if ctx.input.right {
        1.0
    } else if ctx.input.left {
        -1.0
    } else {
        state.last_dir
    };
    state.dashing = true;
    state.dash_timer = ctx.tuning.dash_duration;
    state.dash_cooldown = ctx.tuning.dash_cooldown;
    state.last_dir = dir;
    state.wall_sliding = false;
    state.jump_cut_armed = false;
    body.speed = Vector::new(dir * ctx.tuning.dash_speed, 0.0);

    ctx.events.particles(body.pos + Vector::new(0.4, 0.75), DASH_START);
    ctx.events.sound(SoundCue::Dash);
}

/// Dash motion ignores acceleration and gravity; any obstacle ends it in place
fn dash_step(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>) {
    let new_pos = body.pos + body.speed * ctx.dt;
    match ctx.grid.obstacle_at(new_pos, body.size) {
        Some(kind) => {
            ctx.contacts.push(Contact {
                kind,
                pos: new_pos,
                size: body.size,
                dashing: true,
            });
            state.dashing = false;
            state.dash_timer = 0.0;
            body.speed = Vector::ZERO;
        }
        None => body.pos = new_pos,
    }
    ctx.events.particles(body.pos + Vector::new(0.4, 0.5), DASH_TRAIL);
}

fn move_x(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>) {
    let t = ctx.tuning;
    let dt = ctx.dt;
    let max_speed = t.max_speed_for(state.is_boosted());
    let dir = ctx.input.horizontal();

    if dir != 0.0 {
        state.last_dir = dir;
        let mut accel = if state.grounded {
            t.run_accel
        } else {
            t.air_accel
        };
        // Pushing against momentum turns faster
        if body.speed.x != 0.0 && body.speed.x.signum() != dir {
            accel *= t.turn_multiplier;
        }
        body.speed.x += dir * accel * dt;
    } else {
        let decel = if state.grounded {
            t.run_decel
        } else {
            t.air_decel
        };
        if body.speed.x > 0.0 {
            body.speed.x = (body.speed.x - decel * dt).max(0.0);
        } else if body.speed.x < 0.0 {
            body.speed.x = (body.speed.x + decel * dt).min(0.0);
        }
        if body.speed.x.abs() < t.stop_threshold {
            body.speed.x = 0.0;
        }
    }
    body.speed.x = body.speed.x.clamp(-max_speed, max_speed);

    let new_pos = body.pos + Vector::new(body.speed.x * dt, 0.0);
    match ctx.grid.obstacle_at(new_pos, body.size) {
        Some(kind) => {
            ctx.contacts.push(Contact {
                kind,
                pos: new_pos,
                size: body.size,
                dashing: false,
            });
            let can_slide = kind.is_solid()
                && dir != 0.0
                && !state.grounded
                && body.speed.y > 0.0
                && body.speed.x.abs() > 0.0
                && !state.wall_slide_spent;
            if can_slide && !state.wall_sliding {
                state.wall_sliding = true;
                state.wall_dir = dir;
                state.wall_slide_timer = t.wall_slide_duration;
            }
            body.speed.x = 0.0;
        }
        None => {
            body.pos = new_pos;
            state.wall_sliding = false;
            state.wall_slide_spent = false;
        }
    }
}

fn move_y(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>) {
    let t = ctx.tuning;
    let dt = ctx.dt;

    tick(&mut state.coyote_timer, dt);
    tick(&mut state.jump_buffer_timer, dt);
    if ctx.input.up && !state.was_up {
        state.jump_buffer_timer = t.jump_buffer;
    }

    if state.wall_slide_timer > 0.0 {
        state.wall_slide_timer -= dt;
        if state.wall_slide_timer <= 0.0 {
            state.wall_slide_timer = 0.0;
            if state.wall_sliding {
                state.wall_sliding = false;
                state.wall_slide_spent = true;
            }
        }
    }

    if state.wall_sliding && state.wall_slide_timer > 0.0 {
        body.speed.y =
            (body.speed.y + dt * t.gravity * t.wall_slide_gravity_scale).min(t.wall_slide_speed);
        let side = if state.wall_dir > 0.0 { 0.8 } else { 0.0 };
        ctx.events.particles(body.pos + Vector::new(side, 0.5), WALL_SPARKS);
        if !state.wall_slide_cue_played {
            ctx.events.sound(SoundCue::WallSlide);
            state.wall_slide_cue_played = true;
        }
    } else {
        body.speed.y =
            (body.speed.y + dt * t.gravity).clamp(-t.terminal_velocity, t.terminal_velocity);
        state.wall_slide_cue_played = false;
        state.wall_sliding = false;
    }

    let new_pos = body.pos + Vector::new(0.0, body.speed.y * dt);
    let obstacle = ctx.grid.obstacle_at(new_pos, body.size);
    match obstacle {
        Some(kind) => {
            ctx.contacts.push(Contact {
                kind,
                pos: new_pos,
                size: body.size,
                dashing: false,
            });
            if body.speed.y > 0.0 {
                if !state.grounded {
                    ctx.events.sound(SoundCue::Land);
                    ctx.events.particles(body.pos + Vector::new(0.4, 1.0), LAND_DUST);
                }
                state.grounded = true;
                state.coyote_timer = t.coyote_time;
                state.can_double_jump = true;
                state.wall_sliding = false;
                state.wall_slide_spent = false;
                state.jump_cut_armed = false;

                if state.jump_buffer_timer > 0.0 {
                    jump(body, state, ctx, t.jump_speed);
                } else {
                    body.speed.y = 0.0;
                }
            } else {
                // Ceiling
                state.grounded = false;
                body.speed.y = 0.0;
            }
        }
        None => {
            body.pos = new_pos;
            state.grounded = false;
        }
    }

    if state.wall_sliding && state.jump_buffer_timer > 0.0 && state.wall_jump_cooldown <= 0.0 {
        body.speed.y = -t.jump_speed * t.wall_jump_y_scale;
        body.speed.x = -state.wall_dir * t.wall_jump_x_speed;
        state.jump_buffer_timer = 0.0;
        state.wall_sliding = false;
        state.wall_slide_timer = 0.0;
        state.wall_slide_spent = false;
        state.can_double_jump = true;
        state.wall_jump_cooldown = t.wall_jump_cooldown;
        state.jump_cut_armed = true;

        let side = if state.wall_dir > 0.0 { 0.8 } else { 0.0 };
        ctx.events.particles(body.pos + Vector::new(side, 0.75), WALL_KICK);
        ctx.events.sound(SoundCue::WallJump);
        return;
    }

    if obstacle.is_none() && state.jump_buffer_timer > 0.0 && !state.wall_sliding {
        if state.coyote_timer > 0.0 {
            jump(body, state, ctx, t.jump_speed);
        } else if state.can_double_jump {
            // Stack on top of a faster launch instead of replacing it
            if body.speed.y < -t.jump_speed {
                body.speed.y -= t.jump_speed;
            } else {
                body.speed.y = -t.jump_speed;
            }
            state.jump_buffer_timer = 0.0;
            state.can_double_jump = false;
            state.jump_cut_armed = true;
            ctx.events.particles(body.pos + Vector::new(0.4, 0.75), DOUBLE_JUMP_RING);
            ctx.events.sound(SoundCue::Jump);
        }
    }

    if body.speed.y >= 0.0 {
        state.jump_cut_armed = false;
    }
    let cut = -t.jump_speed / 2.0;
    if state.jump_cut_armed && !ctx.input.up && body.speed.y < cut {
        body.speed.y = cut;
        state.jump_cut_armed = false;
    }
}

/// Ground or coyote jump
fn jump(body: &mut Body, state: &mut PlayerState, ctx: &mut ActContext<'_>, speed: f64) {
    body.speed.y = -speed;
    state.jump_buffer_timer = 0.0;
    state.coyote_timer = 0.0;
    state.jump_cut_armed = true;
    ctx.events.particles(body.pos + Vector::new(0.4, 1.0), JUMP_PUFF);
    ctx.events.sound(SoundCue::Jump);
}
