use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest bounding box used by any piece (the I-piece).
pub const MAX_SHAPE_SIZE: usize = 4;

type ShapeGrid = [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];

/// Square occupancy grid of a piece.
///
/// Only the top-left `size × size` corner of the backing array is meaningful:
/// 4 for the I-piece, 2 for the O-piece and 3 for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    size: usize,
    grid: ShapeGrid,
}

impl Shape {
    const fn new(size: usize, rows: &[&[u8]]) -> Self {
        let mut grid = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                grid[y][x] = rows[y][x] != 0;
                x += 1;
            }
            y += 1;
        }
        Self { size, grid }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns whether the cell at (`row`, `col`) is filled.
    ///
    /// Cells outside the bounding box are reported as empty.
    #[must_use]
    pub const fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.grid[row][col]
    }

    /// Returns the filled cells as `(row, col)` offsets inside the bounding box.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |row| {
            (0..self.size).filter_map(move |col| self.grid[row][col].then_some((row, col)))
        })
    }

    /// Number of filled cells (4 for every tetromino).
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.filled_cells().count()
    }
}

/// Rotates `shape` clockwise by `rotation` quarter turns.
///
/// The transform is always applied from the given grid, so callers pass the
/// canonical orientation and get the requested state back. Applying it to a
/// rotated grid composes the turns.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceKind, Rotation, rotate};
///
/// let t = PieceKind::T.shape();
/// assert_eq!(rotate(t, Rotation::new(4)), *t);
/// assert_ne!(rotate(t, Rotation::new(1)), *t);
/// ```
#[must_use]
pub const fn rotate(shape: &Shape, rotation: Rotation) -> Shape {
    let size = shape.size;
    let mut result = *shape;
    let mut turn = 0;
    while turn < rotation.0 {
        let mut grid = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                grid[x][size - 1 - y] = result.grid[y][x];
                x += 1;
            }
            y += 1;
        }
        result = Shape { size, grid };
        turn += 1;
    }
    result
}

/// Rotation state of a piece, always in `0..4`.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Rotation(u8);

impl From<u8> for Rotation {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Rotation> for u8 {
    fn from(value: Rotation) -> Self {
        value.0
    }
}

impl Rotation {
    pub const SPAWN: Self = Self(0);
    pub const ALL: [Self; 4] = [Self(0), Self(1), Self(2), Self(3)];

    /// Creates a rotation state, reducing `turns` modulo 4.
    #[must_use]
    pub const fn new(turns: u8) -> Self {
        Self(turns % 4)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn rotated(self, direction: RotationDirection) -> Self {
        match direction {
            RotationDirection::Clockwise => Self((self.0 + 1) % 4),
            RotationDirection::CounterClockwise => Self((self.0 + 3) % 4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// The seven piece kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    I = 0,
    J = 1,
    L = 2,
    O = 3,
    S = 4,
    T = 5,
    Z = 6,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl PieceKind {
    /// Number of piece kinds (7).
    pub const LEN: usize = 7;

    /// Every kind in table order.
    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::J,
        Self::L,
        Self::O,
        Self::S,
        Self::T,
        Self::Z,
    ];

    /// Returns the canonical (spawn) shape.
    #[must_use]
    pub fn shape(self) -> &'static Shape {
        &ROTATED_SHAPES[self as usize][0]
    }

    /// Returns the shape in the given rotation state.
    #[must_use]
    pub fn rotated_shape(self, rotation: Rotation) -> &'static Shape {
        &ROTATED_SHAPES[self as usize][rotation.index()]
    }

    /// Display color as a `#RRGGBB` string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::I => "#00FFFF",
            Self::J => "#0000FF",
            Self::L => "#FF8800",
            Self::O => "#FFFF00",
            Self::S => "#00FF00",
            Self::T => "#9900FF",
            Self::Z => "#FF0000",
        }
    }

    /// Display color as RGB components.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::I => (0x00, 0xFF, 0xFF),
            Self::J => (0x00, 0x00, 0xFF),
            Self::L => (0xFF, 0x88, 0x00),
            Self::O => (0xFF, 0xFF, 0x00),
            Self::S => (0x00, 0xFF, 0x00),
            Self::T => (0x99, 0x00, 0xFF),
            Self::Z => (0xFF, 0x00, 0x00),
        }
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::Z.as_char(), 'Z');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::I => 'I',
            Self::J => 'J',
            Self::L => 'L',
            Self::O => 'O',
            Self::S => 'S',
            Self::T => 'T',
            Self::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('T'), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::I),
            'J' => Some(Self::J),
            'L' => Some(Self::L),
            'O' => Some(Self::O),
            'S' => Some(Self::S),
            'T' => Some(Self::T),
            'Z' => Some(Self::Z),
            _ => None,
        }
    }
}

const fn shape_rotations(shape: Shape) -> [Shape; 4] {
    [
        rotate(&shape, Rotation(0)),
        rotate(&shape, Rotation(1)),
        rotate(&shape, Rotation(2)),
        rotate(&shape, Rotation(3)),
    ]
}

static ROTATED_SHAPES: [[Shape; 4]; PieceKind::LEN] = [
    // I-piece
    shape_rotations(Shape::new(
        4,
        &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
    )),
    // J-piece
    shape_rotations(Shape::new(3, &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]])),
    // L-piece
    shape_rotations(Shape::new(3, &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]])),
    // O-piece
    shape_rotations(Shape::new(2, &[&[1, 1], &[1, 1]])),
    // S-piece
    shape_rotations(Shape::new(3, &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]])),
    // T-piece
    shape_rotations(Shape::new(3, &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]])),
    // Z-piece
    shape_rotations(Shape::new(3, &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]])),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(shape: &Shape) -> Vec<(usize, usize)> {
        shape.filled_cells().collect()
    }

    #[test]
    fn test_every_shape_has_four_cells_in_every_rotation() {
        for kind in PieceKind::ALL {
            for rotation in Rotation::ALL {
                assert_eq!(kind.rotated_shape(rotation).filled_count(), 4, "{kind} {rotation:?}");
            }
        }
    }

    #[test]
    fn test_four_rotations_round_trip() {
        for kind in PieceKind::ALL {
            let mut shape = *kind.shape();
            for _ in 0..4 {
                shape = rotate(&shape, Rotation::new(1));
            }
            assert_eq!(shape, *kind.shape(), "{kind}");
        }
    }

    #[test]
    fn test_rotation_is_taken_modulo_four() {
        for kind in PieceKind::ALL {
            for turns in 0..12 {
                assert_eq!(
                    rotate(kind.shape(), Rotation::new(turns)),
                    *kind.rotated_shape(Rotation::new(turns % 4))
                );
            }
        }
    }

    #[test]
    fn test_rotation_from_canonical_matches_incremental() {
        for kind in PieceKind::ALL {
            let mut incremental = *kind.shape();
            for rotation in Rotation::ALL {
                assert_eq!(incremental, rotate(kind.shape(), rotation));
                incremental = rotate(&incremental, Rotation::new(1));
            }
        }
    }

    #[test]
    fn test_clockwise_rotation_of_t() {
        // .T.    .T.
        // TTT -> .TT
        // ...    .T.
        let rotated = PieceKind::T.rotated_shape(Rotation::new(1));
        assert_eq!(cells(rotated), vec![(0, 1), (1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_clockwise_rotation_of_i() {
        let rotated = PieceKind::I.rotated_shape(Rotation::new(1));
        assert_eq!(cells(rotated), vec![(0, 2), (1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn test_o_is_rotation_invariant() {
        for rotation in Rotation::ALL {
            assert_eq!(PieceKind::O.rotated_shape(rotation), PieceKind::O.shape());
        }
    }

    #[test]
    fn test_rotation_direction() {
        let r = Rotation::SPAWN;
        assert_eq!(r.rotated(RotationDirection::Clockwise), Rotation::new(1));
        assert_eq!(r.rotated(RotationDirection::CounterClockwise), Rotation::new(3));
        assert_eq!(
            r.rotated(RotationDirection::Clockwise)
                .rotated(RotationDirection::CounterClockwise),
            r
        );
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
            assert_eq!(kind.to_string(), kind.as_char().to_string());
        }
        assert_eq!(PieceKind::from_char('x'), None);
    }

    #[test]
    fn test_piece_colors() {
        assert_eq!(PieceKind::I.color(), "#00FFFF");
        assert_eq!(PieceKind::T.color(), "#9900FF");
        assert_eq!(PieceKind::L.rgb(), (0xFF, 0x88, 0x00));
    }

    #[test]
    fn test_rotation_serialization() {
        assert_eq!(serde_json::to_string(&Rotation::new(3)).unwrap(), "3");
        let rotation: Rotation = serde_json::from_str("5").unwrap();
        assert_eq!(rotation, Rotation::new(1));
    }
}
