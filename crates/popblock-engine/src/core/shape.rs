use std::fmt;

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Serialize};

/// Largest bounding box side of any piece (the I-piece).
pub const MAX_SHAPE_SIZE: usize = 4;

/// Enum representing the type of piece.
///
/// The discriminant doubles as the index into the shape catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// O-piece (square).
    O = 0,
    /// I-piece (line).
    I = 1,
    /// T-piece.
    T = 2,
    /// L-piece.
    L = 3,
    /// J-piece (mirrored L).
    J = 4,
    /// S-piece.
    S = 5,
    /// Z-piece.
    Z = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds in catalog order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::O,
        PieceKind::I,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Returns the color identity used when this piece is drawn or locked.
    #[must_use]
    pub const fn color(self) -> ColorId {
        match self {
            PieceKind::O => ColorId::Yellow,
            PieceKind::I => ColorId::LightBlue,
            PieceKind::T => ColorId::Purple,
            PieceKind::L => ColorId::Orange,
            PieceKind::J => ColorId::Blue,
            PieceKind::S => ColorId::Green,
            PieceKind::Z => ColorId::Red,
        }
    }

    /// Shortcut for [`ShapeCatalog::definition_for`].
    #[must_use]
    pub fn definition(self) -> &'static ShapeDefinition {
        ShapeCatalog::definition_for(self)
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// ```
    /// use popblock_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::from_char('T'), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::O => 'O',
            PieceKind::I => 'I',
            PieceKind::T => 'T',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single (uppercase) character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(PieceKind::O),
            'I' => Some(PieceKind::I),
            'T' => Some(PieceKind::T),
            'L' => Some(PieceKind::L),
            'J' => Some(PieceKind::J),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            _ => None,
        }
    }
}

/// Color identity of a placed or falling block.
///
/// The engine only tracks identities; mapping them to actual colors is up to
/// the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorId {
    Yellow,
    LightBlue,
    Purple,
    Orange,
    Blue,
    Green,
    Red,
}

impl ColorId {
    /// Single-letter code used in text renderings of the grid.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            ColorId::Yellow => 'y',
            ColorId::LightBlue => 'l',
            ColorId::Purple => 'p',
            ColorId::Orange => 'o',
            ColorId::Blue => 'b',
            ColorId::Green => 'g',
            ColorId::Red => 'r',
        }
    }

    #[must_use]
    pub const fn from_code(c: char) -> Option<Self> {
        match c {
            'y' => Some(ColorId::Yellow),
            'l' => Some(ColorId::LightBlue),
            'p' => Some(ColorId::Purple),
            'o' => Some(ColorId::Orange),
            'b' => Some(ColorId::Blue),
            'g' => Some(ColorId::Green),
            'r' => Some(ColorId::Red),
            _ => None,
        }
    }
}

/// Rectangular 0/1 cell matrix of a piece in one rotation state.
///
/// Matrices are tight: every row and every column contains at least one
/// occupied cell. Storage is a fixed 4×4 array, so copying a matrix never
/// allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeMatrix {
    rows: usize,
    cols: usize,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl ShapeMatrix {
    const fn from_bits<const R: usize, const C: usize>(bits: [[u8; C]; R]) -> Self {
        assert!(R <= MAX_SHAPE_SIZE && C <= MAX_SHAPE_SIZE);
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut y = 0;
        while y < R {
            let mut x = 0;
            while x < C {
                cells[y][x] = bits[y][x] != 0;
                x += 1;
            }
            y += 1;
        }
        Self {
            rows: R,
            cols: C,
            cells,
        }
    }

    /// Number of rows (height of the bounding box).
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (width of the bounding box).
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if the cell at column `x`, row `y` is part of the piece.
    ///
    /// Coordinates outside the bounding box are reported as empty.
    #[must_use]
    pub const fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.cols && y < self.rows && self.cells[y][x]
    }

    /// Iterates over the occupied cells as `(x, y)` offsets from the top-left corner.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows).flat_map(move |y| {
            (0..self.cols)
                .filter(move |&x| self.cells[y][x])
                .map(move |x| (x, y))
        })
    }

    /// Number of occupied cells (4 for every standard tetromino).
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied_cells().count()
    }

    /// Rotates the matrix 90° clockwise.
    ///
    /// An R×C matrix becomes C×R with `out[i][j] = in[R - 1 - j][i]`.
    #[must_use]
    pub const fn rotated_cw(&self) -> Self {
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut i = 0;
        while i < self.cols {
            let mut j = 0;
            while j < self.rows {
                cells[i][j] = self.cells[self.rows - 1 - j][i];
                j += 1;
            }
            i += 1;
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }
}

impl fmt::Debug for ShapeMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeMatrix({}x{}) ", self.rows, self.cols)?;
        f.debug_list()
            .entries((0..self.rows).map(|y| {
                (0..self.cols)
                    .map(|x| if self.cells[y][x] { '#' } else { '.' })
                    .collect::<String>()
            }))
            .finish()
    }
}

impl fmt::Display for ShapeMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            if y > 0 {
                writeln!(f)?;
            }
            for x in 0..self.cols {
                f.write_str(if self.cells[y][x] { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}

/// Immutable definition of one piece kind: its base matrix and the four
/// precomputed rotation states.
///
/// State 0 is the literal base matrix; states 1 to 3 are successive 90°
/// clockwise rotations. Duplicate states (O, I, S, Z) are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDefinition {
    kind: PieceKind,
    rotations: [ShapeMatrix; 4],
}

impl ShapeDefinition {
    const fn new(kind: PieceKind, base: ShapeMatrix) -> Self {
        let mut rotations = [base; 4];
        let mut i = 1;
        while i < 4 {
            rotations[i] = rotations[i - 1].rotated_cw();
            i += 1;
        }
        Self { kind, rotations }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn color(&self) -> ColorId {
        self.kind.color()
    }

    /// The unrotated matrix (rotation state 0).
    #[must_use]
    pub const fn base(&self) -> &ShapeMatrix {
        &self.rotations[0]
    }

    /// Returns the matrix of the given rotation state (taken modulo 4).
    #[must_use]
    pub const fn rotation(&self, index: usize) -> &ShapeMatrix {
        &self.rotations[index % 4]
    }

    #[must_use]
    pub const fn rotations(&self) -> &[ShapeMatrix; 4] {
        &self.rotations
    }
}

static DEFINITIONS: [ShapeDefinition; PieceKind::LEN] = [
    ShapeDefinition::new(PieceKind::O, ShapeMatrix::from_bits([[1, 1], [1, 1]])),
    ShapeDefinition::new(PieceKind::I, ShapeMatrix::from_bits([[1, 1, 1, 1]])),
    ShapeDefinition::new(PieceKind::T, ShapeMatrix::from_bits([[0, 1, 0], [1, 1, 1]])),
    ShapeDefinition::new(PieceKind::L, ShapeMatrix::from_bits([[1, 0, 0], [1, 1, 1]])),
    ShapeDefinition::new(PieceKind::J, ShapeMatrix::from_bits([[0, 0, 1], [1, 1, 1]])),
    ShapeDefinition::new(PieceKind::S, ShapeMatrix::from_bits([[0, 1, 1], [1, 1, 0]])),
    ShapeDefinition::new(PieceKind::Z, ShapeMatrix::from_bits([[1, 1, 0], [0, 1, 1]])),
];

/// Process-wide, read-only catalog of the seven piece definitions.
///
/// # Example
///
/// ```
/// use popblock_engine::{PieceKind, ShapeCatalog};
///
/// let t = ShapeCatalog::definition_for(PieceKind::T);
/// assert_eq!(t.base().to_string(), ".#.\n###");
/// assert_eq!(t.rotation(1).to_string(), "#.\n##\n#.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeCatalog;

impl ShapeCatalog {
    /// Returns the definition of `kind`. Total: every kind has one.
    #[must_use]
    pub fn definition_for(kind: PieceKind) -> &'static ShapeDefinition {
        &DEFINITIONS[kind.index()]
    }

    /// All definitions in catalog order.
    #[must_use]
    pub fn definitions() -> &'static [ShapeDefinition; PieceKind::LEN] {
        &DEFINITIONS
    }

    /// Uniform choice over the seven kinds. Repeats are allowed; there is no
    /// bag or history constraint.
    pub fn random_kind<R: Rng + ?Sized>(rng: &mut R) -> PieceKind {
        rng.random()
    }
}
