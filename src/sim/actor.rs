//! Actors: every moving or interactive thing that is not terrain
//!
//! One closed enum covers all variants. `Actor::act` is the single update
//! entry point and dispatches on the variant.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::events::EventQueue;
use super::grid::TileGrid;
use super::input::InputState;
use super::player::{self, Contact, PlayerState};
use crate::Vector;
use crate::tuning::Tuning;

pub const PLAYER_WIDTH: f64 = 0.8;
pub const PLAYER_HEIGHT: f64 = 0.95;

/// Horizontal slider speed (`=`)
pub const LAVA_SLIDE_SPEED: f64 = 2.0;
/// Vertical slider speed (`|`)
pub const LAVA_RISE_SPEED: f64 = 2.0;
/// Dropper fall speed (`v`)
pub const LAVA_DROP_SPEED: f64 = 3.0;
pub const PATROL_SPEED: f64 = 2.0;
/// How long a spring stays visibly compressed after a bounce
pub const SPRING_COMPRESS_TIME: f64 = 0.3;

const BONE_BOB_SPEED: f64 = 8.0;
const BONE_BOB_DIST: f64 = 0.07;

/// Stable actor identity (survives removals from the actor list)
pub type ActorId = u32;

/// Axis-aligned box with velocity. `pos` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vector,
    pub size: Vector,
    /// Units per second
    pub speed: Vector,
}

impl Body {
    pub fn new(pos: Vector, size: Vector) -> Self {
        Self {
            pos,
            size,
            speed: Vector::ZERO,
        }
    }

    /// Strict overlap on both axes; touching edges do not count
    pub fn overlaps(&self, other: &Body) -> bool {
        self.pos.x + self.size.x > other.pos.x
            && self.pos.x < other.pos.x + other.size.x
            && self.pos.y + self.size.y > other.pos.y
            && self.pos.y < other.pos.y + other.size.y
    }

    pub fn center(&self) -> Vector {
        self.pos + self.size * 0.5
    }

    pub fn bottom(&self) -> f64 {
        self.pos.y + self.size.y
    }
}

/// Variant payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorKind {
    Player(Box<PlayerState>),
    /// Moving lava. Droppers carry the spawn point they reset to.
    Lava { repeat_pos: Option<Vector> },
    Bone { base_pos: Vector, wobble: f64 },
    Spring { compress_timer: f64 },
    Spike,
    Patrol { wobble: f64 },
    SpeedBoost { wobble: f64 },
    Shield { wobble: f64 },
    BreakableWall { broken: bool },
}

/// Payload-free discriminant, handy for matching and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Player,
    Lava,
    Bone,
    Spring,
    Spike,
    Patrol,
    SpeedBoost,
    Shield,
    BreakableWall,
}

/// Per-step inputs shared by all actors
pub struct ActContext<'a> {
    pub dt: f64,
    pub grid: &'a TileGrid,
    pub input: &'a InputState,
    pub tuning: &'a Tuning,
    pub events: &'a mut EventQueue,
    /// Terrain contacts, in the order they happened
    pub contacts: &'a mut Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub body: Body,
    pub kind: ActorKind,
}

impl Actor {
    /// Spawn the actor for plan character `ch` at cell `(x, y)`
    pub fn spawn(id: ActorId, ch: char, x: usize, y: usize) -> Option<Self> {
        let cell = Vector::new(x as f64, y as f64);
        let (offset, size, speed, kind) = match ch {
            '@' => (
                Vector::new(0.0, -0.5),
                Vector::new(PLAYER_WIDTH, PLAYER_HEIGHT),
                Vector::ZERO,
                ActorKind::Player(Box::default()),
            ),
            'o' => {
                let offset = Vector::new(0.2, 0.1);
                // Deterministic per-cell phase so bones don't bob in lockstep
                let wobble = (x as f64 * 1.7 + y as f64 * 0.9) % TAU;
                (
                    offset,
                    Vector::splat(0.6),
                    Vector::ZERO,
                    ActorKind::Bone {
                        base_pos: cell + offset,
                        wobble,
                    },
                )
            }
            '=' => (
                Vector::ZERO,
                Vector::ONE,
                Vector::new(LAVA_SLIDE_SPEED, 0.0),
                ActorKind::Lava { repeat_pos: None },
            ),
            '|' => (
                Vector::ZERO,
                Vector::ONE,
                Vector::new(0.0, LAVA_RISE_SPEED),
                ActorKind::Lava { repeat_pos: None },
            ),
            'v' => (
                Vector::ZERO,
                Vector::ONE,
                Vector::new(0.0, LAVA_DROP_SPEED),
                ActorKind::Lava {
                    repeat_pos: Some(cell),
                },
            ),
            '^' => (
                Vector::new(0.1, 0.5),
                Vector::new(0.8, 0.5),
                Vector::ZERO,
                ActorKind::Spring {
                    compress_timer: 0.0,
                },
            ),
            'S' => (
                Vector::new(0.1, 0.5),
                Vector::new(0.8, 0.5),
                Vector::ZERO,
                ActorKind::Spike,
            ),
            'P' => (
                Vector::new(0.0, -0.2),
                Vector::new(0.8, 1.2),
                Vector::new(PATROL_SPEED, 0.0),
                ActorKind::Patrol { wobble: 0.0 },
            ),
            '+' => (
                Vector::splat(0.2),
                Vector::splat(0.6),
                Vector::ZERO,
                ActorKind::SpeedBoost { wobble: 0.0 },
            ),
            '*' => (
                Vector::splat(0.2),
                Vector::splat(0.6),
                Vector::ZERO,
                ActorKind::Shield { wobble: 0.0 },
            ),
            'B' => (
                Vector::ZERO,
                Vector::ONE,
                Vector::ZERO,
                ActorKind::BreakableWall { broken: false },
            ),
            _ => return None,
        };

        Some(Self {
            id,
            body: Body {
                pos: cell + offset,
                size,
                speed,
            },
            kind,
        })
    }

    pub fn actor_type(&self) -> ActorType {
        match self.kind {
            ActorKind::Player(_) => ActorType::Player,
            ActorKind::Lava { .. } => ActorType::Lava,
            ActorKind::Bone { .. } => ActorType::Bone,
            ActorKind::Spring { .. } => ActorType::Spring,
            ActorKind::Spike => ActorType::Spike,
            ActorKind::Patrol { .. } => ActorType::Patrol,
            ActorKind::SpeedBoost { .. } => ActorType::SpeedBoost,
            ActorKind::Shield { .. } => ActorType::Shield,
            ActorKind::BreakableWall { .. } => ActorType::BreakableWall,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player(_))
    }

    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.kind {
            ActorKind::Player(state) => Some(state.as_ref()),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            ActorKind::Player(state) => Some(state.as_mut()),
            _ => None,
        }
    }

    /// Broken walls are swept out at the start of the next frame
    pub fn is_broken(&self) -> bool {
        matches!(self.kind, ActorKind::BreakableWall { broken: true })
    }

    /// Advance this actor by one substep
    pub fn act(&mut self, ctx: &mut ActContext<'_>) {
        let dt = ctx.dt;
        let body = &mut self.body;
        match &mut self.kind {
            ActorKind::Player(state) => player::act(body, state, ctx),
            ActorKind::Lava { repeat_pos } => {
                let new_pos = body.pos + body.speed * dt;
                if ctx.grid.obstacle_at(new_pos, body.size).is_none() {
                    body.pos = new_pos;
                } else if let Some(spawn) = repeat_pos {
                    body.pos = *spawn;
                } else {
                    body.speed = -body.speed;
                }
            }
            ActorKind::Bone { base_pos, wobble } => {
                *wobble += dt * BONE_BOB_SPEED;
                body.pos = *base_pos + Vector::new(0.0, wobble.sin() * BONE_BOB_DIST);
            }
            ActorKind::Spring { compress_timer } => {
                if *compress_timer > 0.0 {
                    *compress_timer = (*compress_timer - dt).max(0.0);
                }
            }
            ActorKind::Patrol { wobble } => {
                *wobble += dt * 8.0;
                patrol_step(body, ctx.grid, dt);
            }
            ActorKind::SpeedBoost { wobble } => *wobble += dt * 6.0,
            ActorKind::Shield { wobble } => *wobble += dt * 4.0,
            ActorKind::Spike | ActorKind::BreakableWall { .. } => {}
        }
    }
}

/// Pace along a platform, turning at walls and at ledges
fn patrol_step(body: &mut Body, grid: &TileGrid, dt: f64) {
    let new_pos = body.pos + body.speed * dt;
    if grid.obstacle_at(new_pos, body.size).is_some() {
        body.speed = -body.speed;
        return;
    }

    // Probe just below the leading foot
    let lead_x = if body.speed.x > 0.0 {
        new_pos.x + body.size.x
    } else {
        new_pos.x
    };
    let below_y = new_pos.y + body.size.y + 0.1;
    let floor = grid.cell(lead_x.floor() as i64, below_y.floor() as i64);
    if floor.is_none_or(|cell| cell.is_empty()) {
        body.speed = -body.speed;
    } else {
        body.pos = new_pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::CellKind;

    fn step(actor: &mut Actor, grid: &TileGrid, dt: f64) {
        let input = InputState::default();
        let tuning = Tuning::default();
        let mut events = EventQueue::default();
        let mut contacts = Vec::new();
        let mut ctx = ActContext {
            dt,
            grid,
            input: &input,
            tuning: &tuning,
            events: &mut events,
            contacts: &mut contacts,
        };
        actor.act(&mut ctx);
    }

    fn floor_grid(width: usize, height: usize) -> TileGrid {
        let mut grid = TileGrid::new(width, height);
        for x in 0..width as i64 {
            grid.set(x, height as i64 - 1, CellKind::Wall);
        }
        grid
    }

    #[test]
    fn test_spawn_geometry() {
        let player = Actor::spawn(1, '@', 3, 4).unwrap();
        assert_eq!(player.body.pos, Vector::new(3.0, 3.5));
        assert_eq!(player.body.size, Vector::new(PLAYER_WIDTH, PLAYER_HEIGHT));
        assert_eq!(player.actor_type(), ActorType::Player);

        let patrol = Actor::spawn(2, 'P', 1, 1).unwrap();
        assert_eq!(patrol.body.speed, Vector::new(PATROL_SPEED, 0.0));
        assert!((patrol.body.bottom() - 2.0).abs() < 1e-12);

        assert!(Actor::spawn(3, 'x', 0, 0).is_none());
        assert!(Actor::spawn(3, ' ', 0, 0).is_none());
    }

    #[test]
    fn test_slider_lava_bounces() {
        // Wall at both ends of a 4-wide corridor
        let mut grid = TileGrid::new(4, 1);
        grid.set(0, 0, CellKind::Wall);
        grid.set(3, 0, CellKind::Wall);
        let mut lava = Actor::spawn(1, '=', 1, 0).unwrap();
        for _ in 0..8 {
            step(&mut lava, &grid, 0.1);
        }
        assert!(lava.body.speed.x < 0.0);
        assert!(lava.body.pos.x >= 1.0 && lava.body.pos.x <= 2.0);
    }

    #[test]
    fn test_dropper_resets_to_spawn() {
        let grid = floor_grid(3, 4);
        let mut drop = Actor::spawn(1, 'v', 1, 0).unwrap();
        let spawn = drop.body.pos;
        // Falls toward the floor, then the floor sends it home
        for _ in 0..10 {
            step(&mut drop, &grid, 0.05);
        }
        assert!(drop.body.pos.y > spawn.y);
        for _ in 0..10 {
            step(&mut drop, &grid, 0.05);
            if drop.body.pos == spawn {
                break;
            }
        }
        assert_eq!(drop.body.pos, spawn);
        assert_eq!(drop.body.speed, Vector::new(0.0, LAVA_DROP_SPEED));
    }

    #[test]
    fn test_patrol_turns_at_ledge() {
        // Platform cells x=1..=3 on row 2; patrol stands on it
        let mut grid = TileGrid::new(6, 4);
        for x in 1..=3 {
            grid.set(x, 2, CellKind::Wall);
        }
        let mut patrol = Actor::spawn(1, 'P', 1, 1).unwrap();
        for _ in 0..200 {
            step(&mut patrol, &grid, 0.05);
            assert!(patrol.body.pos.x >= 1.0 - 1e-9);
            assert!(patrol.body.pos.x + patrol.body.size.x <= 4.0 + 1e-9);
        }
    }

    #[test]
    fn test_bone_bobs_around_base() {
        let grid = TileGrid::new(3, 3);
        let mut bone = Actor::spawn(1, 'o', 1, 1).unwrap();
        for _ in 0..50 {
            step(&mut bone, &grid, 0.02);
            assert!((bone.body.pos.y - 1.1).abs() <= BONE_BOB_DIST + 1e-12);
            assert!((bone.body.pos.x - 1.2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Body::new(Vector::new(0.0, 0.0), Vector::ONE);
        let b = Body::new(Vector::new(1.0, 0.0), Vector::ONE);
        let c = Body::new(Vector::new(0.5, 0.5), Vector::ONE);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
