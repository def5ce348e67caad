//! Static terrain and box-vs-terrain collision
//!
//! The grid is the only thing bodies collide with physically. Queries are
//! total: anything left, right or above the grid reads as wall, anything
//! below it reads as lava, so falling out of the level is death rather than
//! free space.

use serde::{Deserialize, Serialize};

use crate::Vector;

/// Classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Empty,
    Wall,
    Lava,
    /// Destructible solid (`?` blocks and the cell under a breakable wall)
    Block,
}

impl CellKind {
    /// Blocks bodies the way a wall does
    pub fn is_solid(self) -> bool {
        matches!(self, CellKind::Wall | CellKind::Block)
    }

    pub fn is_empty(self) -> bool {
        self == CellKind::Empty
    }
}

/// Row-major grid of cell classifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

impl TileGrid {
    /// An all-empty grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellKind::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at integer coordinates, `None` outside the grid
    pub fn cell(&self, x: i64, y: i64) -> Option<CellKind> {
        let idx = self.index(x, y)?;
        Some(self.cells[idx])
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, x: i64, y: i64, kind: CellKind) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = kind;
        }
    }

    /// Turn a `Block` cell into `Empty`. Returns whether anything changed.
    pub fn clear_block(&mut self, x: i64, y: i64) -> bool {
        match self.index(x, y) {
            Some(idx) if self.cells[idx] == CellKind::Block => {
                self.cells[idx] = CellKind::Empty;
                true
            }
            _ => false,
        }
    }

    /// Integer cell range covered by a box: `(x0, x1, y0, y1)`, end-exclusive
    pub fn covered_range(pos: Vector, size: Vector) -> (i64, i64, i64, i64) {
        (
            pos.x.floor() as i64,
            (pos.x + size.x).ceil() as i64,
            pos.y.floor() as i64,
            (pos.y + size.y).ceil() as i64,
        )
    }

    /// First obstacle covered by the box at `pos`, scanning row-major.
    ///
    /// Callers pass the *proposed* position and decide themselves whether
    /// to commit the move.
    pub fn obstacle_at(&self, pos: Vector, size: Vector) -> Option<CellKind> {
        let (x0, x1, y0, y1) = Self::covered_range(pos, size);

        if x0 < 0 || x1 > self.width as i64 || y0 < 0 {
            return Some(CellKind::Wall);
        }
        if y1 > self.height as i64 {
            return Some(CellKind::Lava);
        }

        for y in y0..y1 {
            for x in x0..x1 {
                match self.cell(x, y) {
                    Some(kind) if !kind.is_empty() => return Some(kind),
                    _ => {}
                }
            }
        }
        None
    }

    /// Whether every cell in the row is non-empty
    pub fn row_is_solid(&self, y: i64) -> bool {
        (0..self.width as i64).all(|x| self.cell(x, y).is_some_and(|c| !c.is_empty()))
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}
