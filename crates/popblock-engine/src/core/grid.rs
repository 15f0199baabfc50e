use std::fmt;

use serde::{Deserialize, Serialize};

use super::{piece::ActivePiece, shape::ColorId};

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    /// Cell holding a block of a locked piece.
    Occupied(ColorId),
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub const fn is_occupied(self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub const fn color(self) -> Option<ColorId> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(color) => Some(color),
        }
    }

    /// Text code of the cell: `.` for empty, the color code otherwise.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Occupied(color) => color.code(),
        }
    }
}

/// Fixed-size cell matrix holding the blocks of locked pieces.
///
/// Storage is row-major with row 0 at the top. The dimensions are fixed at
/// construction; every operation keeps them intact.
///
/// # Coordinate System
///
/// - `x` grows rightward, `0..width`
/// - `y` grows downward, `0..height`
/// - Negative `y` is the area above the visible grid. Pieces may have cells
///   there; those cells never collide with anything.
///
/// # Example
///
/// ```
/// use popblock_engine::{ActivePiece, Grid, PieceKind};
///
/// let mut grid = Grid::default();
/// let mut piece = ActivePiece::new(PieceKind::O, 4, 0);
/// piece.hard_drop(&grid);
/// assert!(grid.place(&piece));
/// assert!(grid.completed_rows().is_empty());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}

impl Grid {
    pub const DEFAULT_WIDTH: usize = 10;
    pub const DEFAULT_HEIGHT: usize = 20;

    /// Creates an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Returns the cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Overwrites the cell at `(x, y)`. Returns `false` outside the grid.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Returns row `y` as a slice of `width` cells.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[must_use]
    pub fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..][..self.width]
    }

    /// Iterates over the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width)
    }

    /// Number of occupied cells in the whole grid.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Checks whether `piece`, shifted by `(offset_x, offset_y)`, would collide.
    ///
    /// A cell collides when it is left of column 0, right of the last column,
    /// below the last row, or on an occupied cell. Cells above row 0 only
    /// collide horizontally.
    #[must_use]
    pub fn is_collision(&self, piece: &ActivePiece, offset_x: i32, offset_y: i32) -> bool {
        piece.cells_offset(offset_x, offset_y).any(|(x, y)| {
            if x < 0 || x >= self.width_i32() || y >= self.height_i32() {
                return true;
            }
            y >= 0 && self.get(x, y).is_some_and(Cell::is_occupied)
        })
    }

    /// Writes the piece's blocks into the grid.
    ///
    /// Legality is verified for every cell before anything is written: if any
    /// cell lies outside the grid (including above row 0) or on an occupied
    /// cell, the grid is left untouched and `false` is returned.
    #[must_use]
    pub fn place(&mut self, piece: &ActivePiece) -> bool {
        let fits = piece
            .cells()
            .all(|(x, y)| self.get(x, y).is_some_and(Cell::is_empty));
        if !fits {
            return false;
        }
        let cell = Cell::Occupied(piece.color());
        for (x, y) in piece.cells() {
            self.set(x, y, cell);
        }
        true
    }

    /// Returns `true` if every cell of row `y` is occupied.
    #[must_use]
    pub fn is_row_complete(&self, y: usize) -> bool {
        y < self.height && self.row(y).iter().all(|c| c.is_occupied())
    }

    /// Returns the indices of all complete rows, ascending.
    #[must_use]
    pub fn completed_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_row_complete(y)).collect()
    }

    /// Removes the given rows and inserts as many empty rows at the top.
    ///
    /// Rows may be given in any order and need not be contiguous or complete.
    /// Remaining rows keep their relative order, each shifting down by the
    /// number of removed rows below it. Duplicate indices count once;
    /// out-of-range indices are ignored.
    pub fn clear_rows(&mut self, rows: &[usize]) {
        debug_assert!(
            rows.iter().all(|&y| y < self.height),
            "row index out of range: {rows:?} (height {})",
            self.height
        );
        let mut removed = vec![false; self.height];
        for &y in rows {
            if let Some(flag) = removed.get_mut(y) {
                *flag = true;
            }
        }

        let width = self.width;
        let mut shift = 0;
        for y in (0..self.height).rev() {
            if removed[y] {
                shift += 1;
                continue;
            }
            if shift > 0 {
                let src = y * width;
                self.cells.copy_within(src..src + width, src + shift * width);
            }
        }
        self.cells[..shift * width].fill(Cell::Empty);
        debug_assert_eq!(self.cells.len(), self.width * self.height);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn width_i32(&self) -> i32 {
        self.width as i32
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn height_i32(&self) -> i32 {
        self.height as i32
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({}x{})\n{self}", self.width, self.height)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.rows().enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.code())?;
            }
        }
        Ok(())
    }
}
