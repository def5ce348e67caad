//! Level orchestration
//!
//! A `Level` owns the terrain and every actor of one playthrough. `animate`
//! advances it by a frame, split into bounded substeps; `player_touched` is
//! the single place where win, loss and score change.

use serde::{Deserialize, Serialize};

use super::actor::{ActContext, Actor, ActorId, ActorKind, ActorType, Body, SPRING_COMPRESS_TIME};
use super::events::{DisplayEffect, EventQueue, EventSink, GameEvent, ParticleBurst, SoundCue};
use super::grid::{CellKind, TileGrid};
use super::input::InputState;
use super::player::{Contact, HitOutcome, PlayerState};
use crate::Vector;
use crate::consts::*;
use crate::error::PlanError;
use crate::tuning::Tuning;

const DEATH_BURST: ParticleBurst = ParticleBurst::new(30, 0xff0000, 6.0, 1.0).sizes(4.0, 10.0);
const SHIELD_BURST: ParticleBurst = ParticleBurst::new(20, 0x00aaff, 5.0, 0.6).sizes(3.0, 8.0);
const SECONDARY_SPARKLE: ParticleBurst =
    ParticleBurst::new(15, 0x00ffff, 4.0, 0.8).sizes(3.0, 7.0);
const SPRING_BURST: ParticleBurst = ParticleBurst::new(15, 0x00ff00, 5.0, 0.6).sizes(4.0, 8.0);
const STOMP_BURST: ParticleBurst = ParticleBurst::new(20, 0xff8800, 5.0, 0.6)
    .sizes(3.0, 8.0)
    .gravity(10.0);
const RUBBLE: ParticleBurst = ParticleBurst::new(12, 0x8866aa, 5.0, 0.8)
    .sizes(3.0, 9.0)
    .gravity(15.0);
const POWER_UP_BURST: ParticleBurst = ParticleBurst::new(20, 0xffff00, 4.0, 0.8).sizes(3.0, 8.0);

/// Terminal outcome of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Won,
    Lost,
}

/// Counters shared with the surrounding game. The level owns the bone
/// counts and the score; lives and the level index belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub life: u32,
    /// Bones still in the level
    pub bone: u32,
    pub total_bone: u32,
    pub level: u32,
    pub score: u64,
    pub high_score: u64,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            life: START_LIVES,
            bone: 0,
            total_bone: 0,
            level: 1,
            score: 0,
            high_score: 0,
        }
    }
}

impl GameInfo {
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
        }
    }
}

/// What the player ran into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Touched {
    /// Blocked move against the terrain
    Tile(Contact),
    /// Overlap with another actor
    Actor(ActorId),
}

#[derive(Debug, Clone, Serialize)]
pub struct Level {
    grid: TileGrid,
    /// Plan scan order; contains exactly one player
    actors: Vec<Actor>,
    player_idx: usize,
    status: Option<Status>,
    finish_delay: f64,
    timer: f64,
    combo: u32,
    combo_timer: f64,
    tuning: Tuning,
    #[serde(skip)]
    events: EventQueue,
    #[serde(skip)]
    contacts: Vec<Contact>,
}

impl Level {
    /// Build a level with the default tuning
    pub fn new<S: AsRef<str>>(plan: &[S], info: &mut GameInfo) -> Result<Self, PlanError> {
        Self::with_tuning(plan, info, Tuning::default())
    }

    /// Build a level from a plan. `tuning` is used as given; validate it
    /// first when it comes from outside.
    pub fn with_tuning<S: AsRef<str>>(
        plan: &[S],
        info: &mut GameInfo,
        tuning: Tuning,
    ) -> Result<Self, PlanError> {
        let first = plan.first().ok_or(PlanError::Empty)?;
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(PlanError::Empty);
        }
        let height = plan.len();

        let mut grid = TileGrid::new(width, height);
        let mut actors = Vec::new();
        let mut players = 0;

        for (y, row) in plan.iter().enumerate() {
            let row = row.as_ref();
            let actual = row.chars().count();
            if actual != width {
                return Err(PlanError::RaggedRow {
                    row: y,
                    expected: width,
                    actual,
                });
            }

            for (x, ch) in row.chars().enumerate() {
                let (cx, cy) = (x as i64, y as i64);
                match ch {
                    ' ' => {}
                    'x' => grid.set(cx, cy, CellKind::Wall),
                    '!' => grid.set(cx, cy, CellKind::Lava),
                    '?' => grid.set(cx, cy, CellKind::Block),
                    _ => {
                        let id = actors.len() as ActorId;
                        let actor =
                            Actor::spawn(id, ch, x, y).ok_or(PlanError::UnknownTile { ch, x, y })?;
                        match actor.actor_type() {
                            ActorType::Player => players += 1,
                            ActorType::BreakableWall => grid.set(cx, cy, CellKind::Block),
                            _ => {}
                        }
                        actors.push(actor);
                    }
                }
            }
        }

        match players {
            0 => return Err(PlanError::MissingPlayer),
            1 => {}
            count => return Err(PlanError::MultiplePlayers { count }),
        }
        let player_idx = actors
            .iter()
            .position(Actor::is_player)
            .ok_or(PlanError::MissingPlayer)?;

        let bones = actors
            .iter()
            .filter(|a| a.actor_type() == ActorType::Bone)
            .count() as u32;
        info.bone = bones;
        info.total_bone = bones;

        log::debug!(
            "Level {}x{}: {} actors, {} bones",
            width,
            height,
            actors.len(),
            bones
        );

        Ok(Self {
            grid,
            actors,
            player_idx,
            status: None,
            finish_delay: 0.0,
            timer: 0.0,
            combo: 0,
            combo_timer: 0.0,
            tuning,
            events: EventQueue::default(),
            contacts: Vec::new(),
        })
    }

    /// Advance by one frame of `dt` seconds
    pub fn animate(&mut self, dt: f64, input: &InputState, info: &mut GameInfo) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }

        // Walls broken last frame disappear now
        if self.actors.iter().any(Actor::is_broken) {
            self.actors.retain(|a| !a.is_broken());
            self.reindex_player();
        }

        if self.status.is_none() {
            self.timer += dt;
        }
        if self.combo_timer > 0.0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.combo_timer = 0.0;
                self.combo = 0;
            }
        }
        if self.status.is_some() {
            self.finish_delay -= dt;
        }

        let mut remaining = dt;
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP);
            self.substep(step, input, info);
            remaining -= step;
        }
    }

    /// Non-player actors, then the player, then the player's contacts in
    /// order, then one actor overlap check. The player moves last wherever it
    /// sits in the actor list.
    fn substep(&mut self, dt: f64, input: &InputState, info: &mut GameInfo) {
        {
            let mut ctx = ActContext {
                dt,
                grid: &self.grid,
                input,
                tuning: &self.tuning,
                events: &mut self.events,
                contacts: &mut self.contacts,
            };
            for actor in self.actors.iter_mut().filter(|a| !a.is_player()) {
                actor.act(&mut ctx);
            }
            self.actors[self.player_idx].act(&mut ctx);
        }

        let mut contacts = std::mem::take(&mut self.contacts);
        for contact in contacts.drain(..) {
            self.player_touched(Touched::Tile(contact), info);
        }
        self.contacts = contacts;

        if let Some(id) = self.actor_at(self.player_idx).map(|a| a.id) {
            self.player_touched(Touched::Actor(id), info);
        }

        if self.status == Some(Status::Lost) {
            // Sink into the floor
            let body = &mut self.actors[self.player_idx].body;
            body.pos.y += dt;
            body.size.y = (body.size.y - dt).max(0.0);
        }
    }

    /// First other actor overlapping the actor at `index`
    pub fn actor_at(&self, index: usize) -> Option<&Actor> {
        let actor = self.actors.get(index)?;
        self.actors
            .iter()
            .enumerate()
            .find(|(i, other)| *i != index && actor.body.overlaps(&other.body))
            .map(|(_, other)| other)
    }

    pub fn obstacle_at(&self, pos: Vector, size: Vector) -> Option<CellKind> {
        self.grid.obstacle_at(pos, size)
    }

    /// Resolve a player contact. Nothing changes once the level has a status.
    pub fn player_touched(&mut self, touched: Touched, info: &mut GameInfo) {
        if self.status.is_some() {
            return;
        }

        match touched {
            Touched::Tile(contact) => match contact.kind {
                CellKind::Lava => self.hurt_player(None),
                CellKind::Block if contact.dashing => self.break_blocks(&contact, info),
                _ => {}
            },
            Touched::Actor(id) => {
                let Some(idx) = self.actors.iter().position(|a| a.id == id) else {
                    return;
                };
                match self.actors[idx].actor_type() {
                    ActorType::Lava | ActorType::Spike => self.hurt_player(None),
                    ActorType::Bone => self.collect_bone(idx, info),
                    ActorType::Spring => self.bounce_spring(idx),
                    ActorType::Patrol => self.hit_patrol(idx, info),
                    ActorType::SpeedBoost | ActorType::Shield => self.collect_power_up(idx),
                    ActorType::Player | ActorType::BreakableWall => {}
                }
            }
        }
    }

    /// Lethal contact. `source` is removed when a shield absorbs the hit.
    fn hurt_player(&mut self, source: Option<usize>) {
        let outcome = {
            let player = &mut self.actors[self.player_idx];
            match &mut player.kind {
                ActorKind::Player(state) => state.take_hit(&mut player.body, &self.tuning),
                _ => HitOutcome::Lethal,
            }
        };

        match outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Absorbed => {
                let center = self.player().body.center();
                self.events.sound(SoundCue::ShieldHit);
                self.events.particles(center, SHIELD_BURST);
                self.events.display(DisplayEffect::ScreenShake(4.0));
                if let Some(idx) = source {
                    self.remove_actor(idx);
                }
            }
            HitOutcome::Lethal => {
                self.status = Some(Status::Lost);
                self.finish_delay = FINISH_DELAY;
                self.combo = 0;
                self.combo_timer = 0.0;

                let pos = self.player().body.pos + Vector::new(0.4, 0.75);
                self.events.sound(SoundCue::Die);
                self.events.display(DisplayEffect::ScreenShake(8.0));
                self.events.display(DisplayEffect::Glitch);
                self.events.particles(pos, DEATH_BURST);
                log::info!("Level lost after {:.2}s", self.timer);
            }
        }
    }

    /// Clear every Block cell covered by a dash that ran into one
    fn break_blocks(&mut self, contact: &Contact, info: &mut GameInfo) {
        let (x0, x1, y0, y1) = TileGrid::covered_range(contact.pos, contact.size);
        let mut walls = 0u64;
        let mut blocks = 0u64;

        for y in y0..y1 {
            for x in x0..x1 {
                if !self.grid.clear_block(x, y) {
                    continue;
                }
                let cell = Vector::new(x as f64, y as f64);
                let wall = self.actors.iter_mut().find(|a| {
                    matches!(a.kind, ActorKind::BreakableWall { broken: false }) && a.body.pos == cell
                });
                match wall {
                    Some(wall) => {
                        wall.kind = ActorKind::BreakableWall { broken: true };
                        walls += 1;
                    }
                    None => blocks += 1,
                }
                self.events.particles(cell + Vector::splat(0.5), RUBBLE);
            }
        }

        if walls + blocks > 0 {
            info.add_score(BLOCK_SCORE * blocks);
            self.events.sound(SoundCue::BreakWall);
            self.events.display(DisplayEffect::ScreenShake(3.0));
            log::debug!("Dash broke {} walls and {} blocks", walls, blocks);
        }
    }

    fn collect_bone(&mut self, idx: usize, info: &mut GameInfo) {
        let bone = self.remove_actor(idx);
        info.bone = info.bone.saturating_sub(1);

        self.combo += 1;
        self.combo_timer = COMBO_DECAY;
        info.add_score(BONE_SCORE * u64::from(self.combo.min(10)));

        let pos = bone.body.pos;
        if self.combo >= 3 {
            self.events.display(DisplayEffect::ComboText {
                combo: self.combo,
                pos,
            });
        }
        match self.combo {
            3 => self.events.sound(SoundCue::Combo3),
            5 => self.events.sound(SoundCue::Combo5),
            c if c >= 10 => self.events.sound(SoundCue::Combo10),
            _ => {}
        }
        self.events.display(DisplayEffect::Flash);

        let sparkle = Vector::splat(0.3);
        let count = (25 + self.combo * 3).min(50);
        let burst = ParticleBurst::new(count, 0xffd700, 5.0 + f64::from(self.combo) * 0.5, 1.0)
            .sizes(4.0, 10.0);
        self.events.particles(pos + sparkle, burst);
        self.events.particles(pos + sparkle, SECONDARY_SPARKLE);
        self.events.sound(SoundCue::Collect);

        let bones_left = self
            .actors
            .iter()
            .any(|a| a.actor_type() == ActorType::Bone);
        if !bones_left {
            self.status = Some(Status::Won);
            self.finish_delay = FINISH_DELAY;
            let bonus = self.completion_bonus();
            info.add_score(bonus);
            self.events.sound(SoundCue::Win);
            self.events.display(DisplayEffect::Victory);
            log::info!(
                "Level won in {:.2}s, bonus {}, score {}",
                self.timer,
                bonus,
                info.score
            );
        }
    }

    fn bounce_spring(&mut self, idx: usize) {
        let spring = &mut self.actors[idx];
        if let ActorKind::Spring { compress_timer } = &mut spring.kind {
            *compress_timer = SPRING_COMPRESS_TIME;
        }
        let pos = spring.body.pos + Vector::new(0.4, 0.0);

        let speed = self.tuning.spring_speed;
        if let Some((body, state)) = self.player_parts() {
            state.launch(body, speed);
            state.can_double_jump = true;
        }
        self.events.particles(pos, SPRING_BURST);
        self.events.sound(SoundCue::Spring);
    }

    /// Falling onto a patrol from above its midline stomps it. Height is
    /// taken from the player's bottom before this step's move.
    fn hit_patrol(&mut self, idx: usize, info: &mut GameInfo) {
        let patrol = self.actors[idx].body;
        let player = self.player().body;
        let midline = patrol.pos.y + patrol.size.y / 2.0;
        let was_above = self
            .player_state()
            .and_then(|s| s.prev_bottom)
            .is_some_and(|bottom| bottom <= midline);
        let stomped = player.speed.y > 0.0 && was_above;
        if !stomped {
            self.hurt_player(Some(idx));
            return;
        }

        self.remove_actor(idx);
        let bounce = self.tuning.stomp_bounce;
        if let Some((body, state)) = self.player_parts() {
            state.launch(body, bounce);
            state.can_double_jump = true;
        }
        info.add_score(STOMP_SCORE);
        self.events.particles(patrol.pos + Vector::new(0.4, 0.2), STOMP_BURST);
        self.events.sound(SoundCue::Stomp);
        self.events.display(DisplayEffect::ScreenShake(2.0));
    }

    fn collect_power_up(&mut self, idx: usize) {
        let pickup = self.remove_actor(idx);
        let (boost, shield) = (self.tuning.speed_boost_duration, self.tuning.shield_duration);
        if let Some((_, state)) = self.player_parts() {
            match pickup.kind {
                ActorKind::SpeedBoost { .. } => state.speed_boost_timer = boost,
                ActorKind::Shield { .. } => state.shield_timer = shield,
                _ => {}
            }
        }
        self.events.particles(pickup.body.center(), POWER_UP_BURST);
        self.events.sound(SoundCue::PowerUp);
    }

    /// Time bonus plus combo bonus awarded on winning
    pub fn completion_bonus(&self) -> u64 {
        let time_bonus = (PAR_TIME - self.timer.floor()).max(0.0) as u64;
        time_bonus + u64::from(self.combo) * COMBO_BONUS
    }

    /// Finished once a status is set and its grace period has run out
    pub fn is_finished(&self) -> bool {
        self.status.is_some() && self.finish_delay < 0.0
    }

    fn remove_actor(&mut self, idx: usize) -> Actor {
        let actor = self.actors.remove(idx);
        if idx < self.player_idx {
            self.player_idx -= 1;
        }
        actor
    }

    fn reindex_player(&mut self) {
        if let Some(idx) = self.actors.iter().position(Actor::is_player) {
            self.player_idx = idx;
        }
    }

    fn player_parts(&mut self) -> Option<(&mut Body, &mut PlayerState)> {
        let actor = self.actors.get_mut(self.player_idx)?;
        match &mut actor.kind {
            ActorKind::Player(state) => Some((&mut actor.body, state.as_mut())),
            _ => None,
        }
    }

    // === Accessors ===

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn finish_delay(&self) -> f64 {
        self.finish_delay
    }

    /// Seconds played while unresolved
    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn combo_timer(&self) -> f64 {
        self.combo_timer
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn player(&self) -> &Actor {
        &self.actors[self.player_idx]
    }

    /// Direct access to the player, for tooling and tests
    pub fn player_mut(&mut self) -> &mut Actor {
        &mut self.actors[self.player_idx]
    }

    pub fn player_index(&self) -> usize {
        self.player_idx
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        self.player().as_player()
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        self.player_mut().as_player_mut()
    }

    /// Pending events for collaborators
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain()
    }

    /// Hand every pending event to `sink`
    pub fn forward_events(&mut self, sink: &mut impl EventSink) {
        for event in self.events.drain() {
            sink.handle(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: InputState = InputState {
        left: false,
        right: false,
        up: false,
        shift: false,
    };
    const RIGHT: InputState = InputState {
        left: false,
        right: true,
        up: false,
        shift: false,
    };

    fn build(plan: &[&str]) -> (Level, GameInfo) {
        let mut info = GameInfo::default();
        let level = Level::new(plan, &mut info).unwrap();
        (level, info)
    }

    fn ids_of(level: &Level, kind: ActorType) -> Vec<ActorId> {
        level
            .actors()
            .iter()
            .filter(|a| a.actor_type() == kind)
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn test_rejects_bad_plans() {
        let mut info = GameInfo::default();
        let empty: [&str; 0] = [];
        assert_eq!(Level::new(&empty, &mut info).unwrap_err(), PlanError::Empty);
        assert_eq!(
            Level::new(&["x@", "x"], &mut info).unwrap_err(),
            PlanError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(
            Level::new(&["xx"], &mut info).unwrap_err(),
            PlanError::MissingPlayer
        );
        assert_eq!(
            Level::new(&["@@"], &mut info).unwrap_err(),
            PlanError::MultiplePlayers { count: 2 }
        );
        assert_eq!(
            Level::new(&[" @#"], &mut info).unwrap_err(),
            PlanError::UnknownTile { ch: '#', x: 2, y: 0 }
        );
    }

    #[test]
    fn test_construction_counts_bones() {
        let (level, info) = build(&["     ", " @o o", "xxxxx"]);
        assert_eq!(info.bone, 2);
        assert_eq!(info.total_bone, 2);
        assert_eq!(level.actors().len(), 3);
        assert_eq!(level.player_index(), 0);
        assert_eq!(level.status(), None);
        assert!(!level.is_finished());
    }

    #[test]
    fn test_breakable_wall_sits_on_block() {
        let (level, _) = build(&["    ", " @B ", "xxxx"]);
        assert_eq!(level.grid().cell(2, 1), Some(CellKind::Block));
        assert_eq!(ids_of(&level, ActorType::BreakableWall).len(), 1);
    }

    #[test]
    fn test_lava_tile_is_lethal() {
        let (mut level, mut info) = build(&["      ", "  @   ", "xx!!xx"]);
        level.animate(0.5, &IDLE, &mut info);
        assert_eq!(level.status(), Some(Status::Lost));
        assert_eq!(level.finish_delay(), FINISH_DELAY);
        let events: Vec<_> = level.drain_events().collect();
        assert!(events.contains(&GameEvent::Sound(SoundCue::Die)));
        assert!(events.contains(&GameEvent::Display(DisplayEffect::Glitch)));
    }

    #[test]
    fn test_shield_absorbs_lava() {
        let (mut level, mut info) = build(&["      ", "  @   ", "xx!!xx"]);
        if let Some(state) = level.player_state_mut() {
            state.shield_timer = 5.0;
        }
        for _ in 0..30 {
            level.animate(0.02, &IDLE, &mut info);
            if level.player_state().is_some_and(|s| !s.has_shield()) {
                break;
            }
        }
        let state = level.player_state().unwrap();
        assert!(!state.has_shield());
        assert!(state.is_invulnerable());
        assert_eq!(level.status(), None);
        assert!(level.player().body.speed.y < 0.0);
    }

    #[test]
    fn test_spike_is_lethal() {
        let (mut level, mut info) = build(&["     ", " @S  ", "xxxxx"]);
        for _ in 0..30 {
            level.animate(0.02, &RIGHT, &mut info);
        }
        assert_eq!(level.status(), Some(Status::Lost));
    }

    #[test]
    fn test_stomp_removes_patrol() {
        let (mut level, mut info) = build(&[
            "       ",
            "    @  ",
            "       ",
            "       ",
            "   P   ",
            "xxxxxxx",
        ]);
        for _ in 0..60 {
            level.animate(0.01, &IDLE, &mut info);
            if ids_of(&level, ActorType::Patrol).is_empty() {
                break;
            }
        }
        assert!(ids_of(&level, ActorType::Patrol).is_empty());
        assert_eq!(level.status(), None);
        assert_eq!(info.score, STOMP_SCORE);
        assert_eq!(level.player().body.speed.y, -level.tuning().stomp_bounce);
    }

    #[test]
    fn test_long_drop_stomps_at_any_frame_rate() {
        // Patrol paces on a one-cell pillar straight below the player
        let mut plan = vec!["       ", "   @   "];
        plan.extend(std::iter::repeat_n("       ", 13));
        plan.extend(["   P   ", "   x   ", "xxxxxxx"]);

        for fps in [20.0, 24.0, 30.0, 45.0, 60.0, 120.0, 144.0] {
            let (mut level, mut info) = build(&plan);
            let dt = 1.0 / fps;
            for _ in 0..(3.0 * fps) as usize {
                level.animate(dt, &IDLE, &mut info);
                if level.status().is_some() || ids_of(&level, ActorType::Patrol).is_empty() {
                    break;
                }
            }
            assert_eq!(level.status(), None, "died at {} fps", fps);
            assert!(ids_of(&level, ActorType::Patrol).is_empty(), "no stomp at {} fps", fps);
            assert_eq!(info.score, STOMP_SCORE);
        }
    }

    #[test]
    fn test_patrol_side_contact_is_lethal() {
        let (mut level, mut info) = build(&["       ", " @  P  ", "xxxxxxx"]);
        for _ in 0..120 {
            level.animate(1.0 / 60.0, &RIGHT, &mut info);
            if level.status().is_some() {
                break;
            }
        }
        assert_eq!(level.status(), Some(Status::Lost));
        assert_eq!(ids_of(&level, ActorType::Patrol).len(), 1);
        assert_eq!(info.score, 0);
    }

    #[test]
    fn test_shield_consumes_on_patrol_and_removes_it() {
        let (mut level, mut info) = build(&["       ", " @  P  ", "xxxxxxx"]);
        if let Some(state) = level.player_state_mut() {
            state.shield_timer = 5.0;
        }
        for _ in 0..120 {
            level.animate(1.0 / 60.0, &RIGHT, &mut info);
            if ids_of(&level, ActorType::Patrol).is_empty() {
                break;
            }
        }
        assert!(ids_of(&level, ActorType::Patrol).is_empty());
        assert_eq!(level.status(), None);
        let state = level.player_state().unwrap();
        assert!(!state.has_shield());
        assert!(state.is_invulnerable());
        // Absorbed, not stomped
        assert_eq!(info.score, 0);
    }

    #[test]
    fn test_shield_absorbs_spike() {
        let (mut level, mut info) = build(&["     ", " @S  ", "xxxxx"]);
        if let Some(state) = level.player_state_mut() {
            state.shield_timer = 5.0;
        }
        for _ in 0..60 {
            level.animate(0.02, &RIGHT, &mut info);
            if level.player_state().is_some_and(|s| !s.has_shield()) {
                break;
            }
        }
        let state = level.player_state().unwrap();
        assert!(!state.has_shield());
        assert!(state.is_invulnerable());
        assert_eq!(level.status(), None);
        assert_eq!(ids_of(&level, ActorType::Spike).len(), 1);
        let events: Vec<_> = level.drain_events().collect();
        assert!(events.contains(&GameEvent::Sound(SoundCue::ShieldHit)));
    }

    #[test]
    fn test_spring_launches_player() {
        let (mut level, mut info) = build(&["     ", "     ", " @^  ", "xxxxx"]);
        let mut launched = false;
        for _ in 0..100 {
            level.animate(0.01, &RIGHT, &mut info);
            if level.player().body.speed.y == -level.tuning().spring_speed {
                launched = true;
                break;
            }
        }
        assert!(launched);
        assert!(level.player_state().unwrap().can_double_jump);
        let compressed = level
            .actors()
            .iter()
            .any(|a| matches!(a.kind, ActorKind::Spring { compress_timer } if compress_timer > 0.0));
        assert!(compressed);
    }

    fn dash_right(level: &mut Level, info: &mut GameInfo) {
        for _ in 0..10 {
            level.animate(0.05, &IDLE, info);
        }
        let dash = InputState {
            shift: true,
            right: true,
            ..IDLE
        };
        level.animate(0.05, &dash, info);
        for _ in 0..4 {
            level.animate(0.05, &IDLE, info);
        }
    }

    #[test]
    fn test_dash_smashes_block() {
        let (mut level, mut info) = build(&["        ", " @  ?   ", "xxxxxxxx"]);
        dash_right(&mut level, &mut info);
        assert_eq!(level.grid().cell(4, 1), Some(CellKind::Empty));
        assert_eq!(info.score, BLOCK_SCORE);
        assert!(level.events().iter().any(|e| *e == GameEvent::Sound(SoundCue::BreakWall)));
    }

    #[test]
    fn test_broken_wall_disappears_next_frame() {
        let (mut level, mut info) = build(&["        ", " @  B   ", "xxxxxxxx"]);
        dash_right(&mut level, &mut info);
        assert_eq!(level.grid().cell(4, 1), Some(CellKind::Empty));
        assert_eq!(info.score, 0);
        level.animate(0.05, &IDLE, &mut info);
        assert!(ids_of(&level, ActorType::BreakableWall).is_empty());
        assert!(level.player().is_player());
    }

    #[test]
    fn test_walking_into_block_does_not_break_it() {
        let (mut level, mut info) = build(&["        ", " @  ?   ", "xxxxxxxx"]);
        for _ in 0..40 {
            level.animate(0.05, &RIGHT, &mut info);
        }
        assert_eq!(level.grid().cell(4, 1), Some(CellKind::Block));
        assert!(level.player().body.pos.x + level.player().body.size.x <= 4.0);
    }

    #[test]
    fn test_bone_scoring_and_completion_bonus() {
        let (mut level, mut info) = build(&["     ", " @ooo", "xxxxx"]);
        for id in ids_of(&level, ActorType::Bone) {
            level.player_touched(Touched::Actor(id), &mut info);
        }
        // 100 + 200 + 300, then 60s par plus 3 * 10 combo
        assert_eq!(info.score, 600 + 60 + 30);
        assert_eq!(info.high_score, info.score);
        assert_eq!(info.bone, 0);
        assert_eq!(level.status(), Some(Status::Won));
        assert_eq!(level.combo(), 3);
        assert_eq!(level.combo_timer(), COMBO_DECAY);

        let events: Vec<_> = level.drain_events().collect();
        assert!(events.contains(&GameEvent::Sound(SoundCue::Combo3)));
        assert!(events.contains(&GameEvent::Display(DisplayEffect::Victory)));
    }

    #[test]
    fn test_no_pickups_after_loss() {
        let (mut level, mut info) = build(&["     ", " @ o ", "xxxxx"]);
        let lava = Contact {
            kind: CellKind::Lava,
            pos: Vector::ZERO,
            size: Vector::ONE,
            dashing: false,
        };
        level.player_touched(Touched::Tile(lava), &mut info);
        assert_eq!(level.status(), Some(Status::Lost));

        let bone = ids_of(&level, ActorType::Bone)[0];
        level.player_touched(Touched::Actor(bone), &mut info);
        assert_eq!(info.bone, 1);
        assert_eq!(info.score, 0);
        assert_eq!(level.status(), Some(Status::Lost));
    }

    #[test]
    fn test_power_ups_grant_timers() {
        let (mut level, mut info) = build(&["     ", " @+* ", "xxxxx"]);
        for id in ids_of(&level, ActorType::SpeedBoost)
            .into_iter()
            .chain(ids_of(&level, ActorType::Shield))
        {
            level.player_touched(Touched::Actor(id), &mut info);
        }
        let state = level.player_state().unwrap();
        assert!(state.is_boosted());
        assert!(state.has_shield());
        assert_eq!(level.actors().len(), 1);
    }

    #[test]
    fn test_forward_events_empties_queue() {
        let (mut level, mut info) = build(&["     ", " @ o ", "xxxxx"]);
        let bone = ids_of(&level, ActorType::Bone)[0];
        level.player_touched(Touched::Actor(bone), &mut info);

        let mut sink: Vec<GameEvent> = Vec::new();
        level.forward_events(&mut sink);
        assert!(sink.contains(&GameEvent::Sound(SoundCue::Collect)));
        assert!(level.events().is_empty());
    }

    #[test]
    fn test_timer_stops_once_resolved() {
        let (mut level, mut info) = build(&["     ", " @ o ", "xxxxx"]);
        level.animate(0.5, &IDLE, &mut info);
        let bone = ids_of(&level, ActorType::Bone)[0];
        level.player_touched(Touched::Actor(bone), &mut info);
        let timer = level.timer();
        level.animate(0.5, &IDLE, &mut info);
        assert_eq!(level.timer(), timer);
        assert_eq!(level.finish_delay(), FINISH_DELAY - 0.5);
    }
}
