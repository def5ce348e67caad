//! One-way notifications for audio, particles and display collaborators
//!
//! The simulation never calls into a renderer or mixer. It queues typed
//! events that a subscriber drains once per frame; nobody draining them is
//! fine, the queue is bounded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::Vector;

/// Most events kept between drains; the oldest are dropped first
pub const MAX_EVENTS: usize = 500;

/// Named audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Any player-initiated jump except a wall jump
    Jump,
    Land,
    Dash,
    Collect,
    Die,
    Win,
    Spring,
    Stomp,
    BreakWall,
    PowerUp,
    ShieldHit,
    WallSlide,
    WallJump,
    /// Third pickup in a streak
    Combo3,
    /// Fifth pickup in a streak
    Combo5,
    /// Tenth and every later pickup in a streak
    Combo10,
}

/// Particle burst request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    pub count: u32,
    /// 0xRRGGBB
    pub color: u32,
    pub speed: f64,
    pub lifetime: f64,
    pub size_min: f64,
    pub size_max: f64,
    /// Downward pull on the particles, 0 for none
    pub gravity: f64,
}

impl ParticleBurst {
    pub const fn new(count: u32, color: u32, speed: f64, lifetime: f64) -> Self {
        Self {
            count,
            color,
            speed,
            lifetime,
            size_min: 3.0,
            size_max: 8.0,
            gravity: 0.0,
        }
    }

    pub const fn sizes(mut self, min: f64, max: f64) -> Self {
        self.size_min = min;
        self.size_max = max;
        self
    }

    pub const fn gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }
}

/// Screen-level effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DisplayEffect {
    ScreenShake(f64),
    Flash,
    Glitch,
    Victory,
    ComboText { combo: u32, pos: Vector },
}

/// Everything the simulation tells the outside world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    Particles { pos: Vector, burst: ParticleBurst },
    Display(DisplayEffect),
}

/// Subscriber for drained events
pub trait EventSink {
    fn handle(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn handle(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Bounded FIFO of pending events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
    dropped: u64,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
        if self.pending.len() > MAX_EVENTS {
            let excess = self.pending.len() - MAX_EVENTS;
            self.pending.drain(..excess);
            if self.dropped == 0 {
                log::warn!("event queue full, dropping oldest events (is anyone draining?)");
            }
            self.dropped = self.dropped.saturating_add(excess as u64);
        }
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.push(GameEvent::Sound(cue));
    }

    pub fn particles(&mut self, pos: Vector, burst: ParticleBurst) {
        self.push(GameEvent::Particles { pos, burst });
    }

    pub fn display(&mut self, effect: DisplayEffect) {
        self.push(GameEvent::Display(effect));
    }

    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, GameEvent> {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let mut queue = EventQueue::default();
        queue.sound(SoundCue::Jump);
        for _ in 0..MAX_EVENTS {
            queue.sound(SoundCue::Land);
        }
        assert_eq!(queue.len(), MAX_EVENTS);
        assert_eq!(queue.dropped(), 1);
        assert!(queue.iter().all(|e| *e == GameEvent::Sound(SoundCue::Land)));
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = EventQueue::default();
        queue.display(DisplayEffect::Flash);
        queue.particles(Vector::ZERO, ParticleBurst::new(4, 0xffffff, 2.0, 0.5));
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }
}
