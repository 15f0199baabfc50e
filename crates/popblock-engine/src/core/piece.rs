use serde::{Deserialize, Serialize};

use super::{
    grid::Grid,
    shape::{ColorId, PieceKind, ShapeMatrix},
};

/// Rotation state index in `0..4`.
///
/// State 0 is the catalog's base orientation; each clockwise step adds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Rotation(u8);

impl Rotation {
    pub const LEN: usize = 4;

    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index % 4)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn rotated_cw(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn rotated_ccw(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    #[must_use]
    pub const fn rotated(self, direction: RotationDirection) -> Self {
        match direction {
            RotationDirection::Clockwise => self.rotated_cw(),
            RotationDirection::CounterClockwise => self.rotated_ccw(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// The piece currently under player control.
///
/// `(x, y)` is the top-left corner of the current rotation's matrix in grid
/// coordinates. `y` may be negative while the piece pokes above the grid.
///
/// Movement and rotation are checked against a [`Grid`]; an attempt that would
/// collide leaves the piece untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActivePiece {
    kind: PieceKind,
    rotation: Rotation,
    x: i32,
    y: i32,
}

impl ActivePiece {
    /// Creates a piece in rotation state 0 at `(x, y)`.
    #[must_use]
    pub const fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: Rotation::new(0),
            x,
            y,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn color(&self) -> ColorId {
        self.kind.color()
    }

    /// Matrix of the current rotation state.
    #[must_use]
    pub fn current_shape(&self) -> &'static ShapeMatrix {
        self.kind.definition().rotation(self.rotation.index())
    }

    /// Absolute grid coordinates of the occupied cells.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        self.cells_offset(0, 0)
    }

    /// Absolute grid coordinates of the occupied cells, shifted by `(dx, dy)`.
    pub fn cells_offset(&self, dx: i32, dy: i32) -> impl Iterator<Item = (i32, i32)> + use<> {
        let ox = self.x + dx;
        let oy = self.y + dy;
        self.current_shape()
            .occupied_cells()
            .map(move |(cx, cy)| (ox + offset(cx), oy + offset(cy)))
    }

    /// Returns a copy shifted by `(dx, dy)` without checking collisions.
    #[must_use]
    pub const fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns a copy rotated in place without checking collisions.
    #[must_use]
    pub const fn rotated(&self, direction: RotationDirection) -> Self {
        Self {
            rotation: self.rotation.rotated(direction),
            ..*self
        }
    }

    /// Moves by `(dx, dy)` if the destination does not collide.
    pub fn try_move(&mut self, dx: i32, dy: i32, grid: &Grid) -> bool {
        if grid.is_collision(self, dx, dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// Rotates in place if the new orientation does not collide.
    ///
    /// The anchor never moves: there are no wall kicks, so a rotation that
    /// would overlap a wall or a block is rejected.
    pub fn try_rotate(&mut self, direction: RotationDirection, grid: &Grid) -> bool {
        let rotated = self.rotated(direction);
        if grid.is_collision(&rotated, 0, 0) {
            return false;
        }
        *self = rotated;
        true
    }

    /// Moves the piece straight down as far as it goes.
    ///
    /// Returns the number of rows travelled. The piece itself is not locked.
    pub fn hard_drop(&mut self, grid: &Grid) -> u32 {
        let mut rows = 0;
        while self.try_move(0, 1, grid) {
            rows += 1;
        }
        rows
    }

    /// Where the piece would end up after a hard drop.
    #[must_use]
    pub fn landing_position(&self, grid: &Grid) -> Self {
        let mut ghost = *self;
        ghost.hard_drop(grid);
        ghost
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn offset(v: usize) -> i32 {
    v as i32
}
