//! Procedural level plans
//!
//! A plan is built by walking a cursor left to right and stamping fixed
//! micro-layouts ("segments") onto a framed grid, then scattering bones,
//! power-ups and spikes on cells that have something to stand on. The
//! output uses the same alphabet as hand-authored plans.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{GEN_BASE_WIDTH, GEN_HEIGHT, GEN_WIDTH_PER_DIFFICULTY, MAX_DIFFICULTY};

/// One stamped tile, relative to the cursor column and the floor surface.
/// `dy` counts upward; `dy = -1` is the top floor row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub dx: i64,
    pub dy: i64,
    pub ch: char,
}

const fn feat(dx: i64, dy: i64, ch: char) -> Feature {
    Feature { dx, dy, ch }
}

/// Segment catalog, in unlock order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Platform,
    /// Needs a double jump
    HighPlatform,
    LavaPit,
    Stairs,
    SpringJump,
    WallJumpShaft,
    MovingLava,
    Dropper,
    DoubleSpring,
    Tunnel,
    SpikePit,
    PatrolPlatform,
    PowerUpPlatform,
    /// Dash through to reach the bones
    BreakableCorridor,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 14] = [
        SegmentKind::Platform,
        SegmentKind::HighPlatform,
        SegmentKind::LavaPit,
        SegmentKind::Stairs,
        SegmentKind::SpringJump,
        SegmentKind::WallJumpShaft,
        SegmentKind::MovingLava,
        SegmentKind::Dropper,
        SegmentKind::DoubleSpring,
        SegmentKind::Tunnel,
        SegmentKind::SpikePit,
        SegmentKind::PatrolPlatform,
        SegmentKind::PowerUpPlatform,
        SegmentKind::BreakableCorridor,
    ];

    /// Segments unlocked at `difficulty`
    pub fn available(difficulty: u32) -> &'static [SegmentKind] {
        let unlocked = 6 + difficulty.min(8) as usize;
        &Self::ALL[..unlocked.min(Self::ALL.len())]
    }

    /// Tiles of this segment. Only the power-up platform rolls the RNG.
    pub fn features<R: Rng>(self, rng: &mut R) -> Vec<Feature> {
        match self {
            SegmentKind::Platform => vec![
                feat(0, 2, 'x'),
                feat(1, 2, 'x'),
                feat(2, 2, 'x'),
                feat(1, 3, 'o'),
            ],
            SegmentKind::HighPlatform => vec![
                feat(0, 5, 'x'),
                feat(1, 5, 'x'),
                feat(2, 5, 'x'),
                feat(1, 6, 'o'),
            ],
            SegmentKind::LavaPit => vec![
                feat(0, -1, '!'),
                feat(1, -1, '!'),
                feat(2, -1, '!'),
                feat(1, 3, 'x'),
                feat(1, 4, 'o'),
            ],
            SegmentKind::Stairs => vec![
                feat(0, 1, 'x'),
                feat(1, 2, 'x'),
                feat(2, 3, 'x'),
                feat(3, 4, 'x'),
                feat(3, 5, 'o'),
            ],
            SegmentKind::SpringJump => vec![
                feat(0, 0, '^'),
                feat(3, 7, 'x'),
                feat(4, 7, 'x'),
                feat(3, 8, 'o'),
            ],
            SegmentKind::WallJumpShaft => {
                let mut tiles: Vec<Feature> = (0..6)
                    .flat_map(|dy| [feat(0, dy, 'x'), feat(3, dy, 'x')])
                    .collect();
                tiles.push(feat(1, 6, 'o'));
                tiles.push(feat(2, 6, 'o'));
                tiles
            }
            SegmentKind::MovingLava => vec![
                feat(1, 2, '='),
                feat(3, 4, 'x'),
                feat(4, 4, 'x'),
                feat(3, 5, 'o'),
            ],
            SegmentKind::Dropper => vec![
                feat(1, 8, 'v'),
                feat(3, 0, 'x'),
                feat(4, 0, 'x'),
                feat(3, 1, 'o'),
            ],
            SegmentKind::DoubleSpring => vec![
                feat(0, 0, '^'),
                feat(4, 5, '^'),
                feat(7, 10, 'x'),
                feat(8, 10, 'x'),
                feat(7, 11, 'o'),
                feat(8, 11, 'o'),
            ],
            SegmentKind::Tunnel => {
                let mut tiles: Vec<Feature> = (0..5)
                    .flat_map(|dx| [feat(dx, 0, 'x'), feat(dx, 3, 'x')])
                    .collect();
                tiles.push(feat(2, 1, 'o'));
                tiles
            }
            SegmentKind::SpikePit => vec![
                feat(0, 0, 'S'),
                feat(1, 0, 'S'),
                feat(2, 0, 'S'),
                feat(1, 4, 'x'),
                feat(2, 4, 'x'),
                feat(1, 5, 'o'),
            ],
            SegmentKind::PatrolPlatform => {
                let mut tiles: Vec<Feature> = (0..5).map(|dx| feat(dx, 2, 'x')).collect();
                tiles.push(feat(2, 3, 'P'));
                tiles.push(feat(2, 5, 'o'));
                tiles
            }
            SegmentKind::PowerUpPlatform => {
                let pickup = if rng.random_bool(0.5) { '+' } else { '*' };
                vec![
                    feat(0, 3, 'x'),
                    feat(1, 3, 'x'),
                    feat(2, 3, 'x'),
                    feat(1, 4, pickup),
                ]
            }
            SegmentKind::BreakableCorridor => vec![
                feat(2, 0, 'B'),
                feat(2, 1, 'B'),
                feat(2, 2, 'B'),
                feat(4, 1, 'o'),
                feat(5, 1, 'o'),
            ],
        }
    }
}

/// Mutable character grid used while generating
struct Canvas {
    width: usize,
    height: usize,
    rows: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![' '; width]; height],
        }
    }

    fn get(&self, x: usize, y: usize) -> Option<char> {
        self.rows.get(y)?.get(x).copied()
    }

    fn set(&mut self, x: usize, y: usize, ch: char) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = ch;
        }
    }

    /// Empty, with a non-empty cell directly below
    fn is_standable(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(' ') && self.get(x, y + 1).is_some_and(|below| below != ' ')
    }

    fn contains(&self, ch: char) -> bool {
        self.rows.iter().any(|row| row.contains(&ch))
    }

    fn into_plan(self) -> Vec<String> {
        self.rows.into_iter().map(String::from_iter).collect()
    }
}

/// Difficulty-scaled plan generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGenerator {
    difficulty: u32,
    width: usize,
    height: usize,
}

impl LevelGenerator {
    /// `difficulty` is clamped to `1..=MAX_DIFFICULTY`
    pub fn new(difficulty: u32) -> Self {
        let difficulty = difficulty.clamp(1, MAX_DIFFICULTY);
        Self {
            difficulty,
            width: GEN_BASE_WIDTH + difficulty as usize * GEN_WIDTH_PER_DIFFICULTY,
            height: GEN_HEIGHT,
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Generate from the thread RNG
    pub fn generate(&self) -> Vec<String> {
        self.generate_with(&mut rand::rng())
    }

    /// Reproducible generation
    pub fn generate_seeded(&self, seed: u64) -> Vec<String> {
        log::debug!("Generating difficulty {} level from seed {}", self.difficulty, seed);
        let mut rng = Pcg32::seed_from_u64(seed);
        self.generate_with(&mut rng)
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let (width, height) = (self.width, self.height);
        let d = self.difficulty as usize;
        let floor_y = height - 3;
        let mut canvas = Canvas::new(width, height);

        // Two-row floor and side walls
        for x in 0..width {
            canvas.set(x, height - 1, 'x');
            canvas.set(x, height - 2, 'x');
        }
        for y in 0..height {
            canvas.set(0, y, 'x');
            canvas.set(width - 1, y, 'x');
        }
        canvas.set(2, floor_y, '@');

        // Segments
        let catalog = SegmentKind::available(self.difficulty);
        let mut cursor = 5;
        let mut segments = 0;
        while cursor < width - 8 {
            let kind = catalog[rng.random_range(0..catalog.len())];
            for tile in kind.features(rng) {
                let tx = cursor as i64 + tile.dx;
                let ty = floor_y as i64 - tile.dy;
                // Stay off the side walls
                if tx >= 1 && tx < width as i64 - 2 && ty >= 0 && ty < height as i64 {
                    canvas.set(tx as usize, ty as usize, tile.ch);
                }
            }

            let spacing = 6 + rng.random_range(0..4) + 3usize.saturating_sub(d / 3);
            cursor += spacing;
            segments += 1;
        }

        // Scatter bones on anything standable
        for _ in 0..3 + d {
            let x = 8 + rng.random_range(0..width - 16);
            let y = height - 4 - rng.random_range(0..5);
            if canvas.is_standable(x, y) {
                canvas.set(x, y, 'o');
            }
        }

        if self.difficulty >= 2 && rng.random_bool(0.6) {
            let x = 10 + rng.random_range(0..width - 20);
            let y = height - 4 - rng.random_range(0..3);
            let pickup = if rng.random_bool(0.5) { '+' } else { '*' };
            if canvas.get(x, y) == Some(' ') {
                canvas.set(x, y, pickup);
            }
        }

        if self.difficulty >= 3 {
            for _ in 0..d / 3 {
                let x = 8 + rng.random_range(0..width - 16);
                if canvas.get(x, floor_y) == Some(' ') && canvas.get(x, floor_y + 1) == Some('x') {
                    canvas.set(x, floor_y, 'S');
                }
            }
        }

        // Every level must have something to collect
        if !canvas.contains('o') {
            let spot = (3..width - 2)
                .rev()
                .flat_map(|x| (1..floor_y + 1).rev().map(move |y| (x, y)))
                .find(|&(x, y)| canvas.is_standable(x, y) && canvas.get(x, y + 1) == Some('x'));
            if let Some((x, y)) = spot {
                canvas.set(x, y, 'o');
            }
        }

        log::info!(
            "Generated level: difficulty {}, {}x{}, {} segments",
            self.difficulty,
            width,
            height,
            segments
        );
        canvas.into_plan()
    }
}
