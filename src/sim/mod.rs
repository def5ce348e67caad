//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Bounded substeps only
//! - Seeded RNG only (generation)
//! - Stable iteration order (plan scan order)
//! - No rendering, audio or platform dependencies; collaborators receive events

pub mod actor;
pub mod events;
pub mod generator;
pub mod grid;
pub mod input;
pub mod level;
pub mod player;

pub use actor::{Actor, ActorId, ActorKind, ActorType, Body, PLAYER_HEIGHT, PLAYER_WIDTH};
pub use events::{DisplayEffect, EventQueue, EventSink, GameEvent, MAX_EVENTS, ParticleBurst, SoundCue};
pub use generator::{LevelGenerator, SegmentKind};
pub use grid::{CellKind, TileGrid};
pub use input::InputState;
pub use level::{GameInfo, Level, Status, Touched};
pub use player::{Contact, HitOutcome, MovementMode, PlayerState};
