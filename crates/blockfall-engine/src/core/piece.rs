use serde::{Deserialize, Serialize};

use super::{
    board::Board,
    shape::{PieceKind, Rotation, RotationDirection},
};

/// Wall-kick offsets `(Δcol, Δrow)` tried in order when rotating.
///
/// Negative `Δrow` moves the piece up.
pub const KICK_OFFSETS: [(i32, i32); 8] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, -1),
    (1, -1),
    (-1, -1),
    (2, 0),
    (-2, 0),
];

/// Extra offsets tried after [`KICK_OFFSETS`] for the I-piece.
pub const I_KICK_OFFSETS: [(i32, i32); 2] = [(0, -2), (0, 1)];

/// Returns the kick candidates for `kind`, in the order they are tried.
pub fn kick_offsets(kind: PieceKind) -> impl Iterator<Item = (i32, i32)> {
    let extra: &[(i32, i32)] = if kind == PieceKind::I {
        &I_KICK_OFFSETS
    } else {
        &[]
    };
    KICK_OFFSETS.iter().chain(extra).copied()
}

/// The piece currently under player control.
///
/// `col` and `row` locate the top-left corner of the shape's bounding box.
/// Both may be negative; the board decides which placements are legal.
/// Pieces are immutable values, so every move returns a new piece.
///
/// # Example
///
/// ```
/// use blockfall_engine::{ActivePiece, Board, PieceKind, RotationDirection};
///
/// let board = Board::new(20, 10).unwrap();
/// let piece = ActivePiece::spawn(PieceKind::T, board.cols());
/// let rotated = piece.rotated_with_kicks(&board, RotationDirection::Clockwise);
/// assert!(rotated.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivePiece {
    kind: PieceKind,
    col: i32,
    row: i32,
    rotation: Rotation,
}

impl ActivePiece {
    #[must_use]
    pub const fn new(kind: PieceKind, col: i32, row: i32, rotation: Rotation) -> Self {
        Self {
            kind,
            col,
            row,
            rotation,
        }
    }

    /// Creates a piece in its spawn pose: top row, centered, rotation 0.
    #[must_use]
    pub fn spawn(kind: PieceKind, cols: usize) -> Self {
        let col = i32::try_from(cols / 2).unwrap_or(i32::MAX) - 1;
        Self::new(kind, col, 0, Rotation::SPAWN)
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Returns the board coordinates `(row, col)` of every filled cell.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.kind
            .rotated_shape(self.rotation)
            .filled_cells()
            .map(move |(dr, dc)| (self.row + dr as i32, self.col + dc as i32))
    }

    #[must_use]
    pub const fn shifted(&self, dcol: i32, drow: i32) -> Self {
        Self::new(self.kind, self.col + dcol, self.row + drow, self.rotation)
    }

    #[must_use]
    pub const fn left(&self) -> Self {
        self.shifted(-1, 0)
    }

    #[must_use]
    pub const fn right(&self) -> Self {
        self.shifted(1, 0)
    }

    #[must_use]
    pub const fn down(&self) -> Self {
        self.shifted(0, 1)
    }

    /// Returns the piece rotated in place, without any kick.
    #[must_use]
    pub const fn rotated(&self, direction: RotationDirection) -> Self {
        Self::new(
            self.kind,
            self.col,
            self.row,
            self.rotation.rotated(direction),
        )
    }

    /// Rotates the piece, resolving collisions with the kick table.
    ///
    /// Returns the first non-colliding candidate, or `None` when every
    /// offset collides.
    #[must_use]
    pub fn rotated_with_kicks(&self, board: &Board, direction: RotationDirection) -> Option<Self> {
        self.rotated(direction).kicked(board)
    }

    /// Finds the first kick offset at which this pose fits on `board`.
    ///
    /// The unshifted pose is tried first, so a fitting piece is returned
    /// unchanged.
    #[must_use]
    pub fn kicked(&self, board: &Board) -> Option<Self> {
        kick_offsets(self.kind)
            .map(|(dcol, drow)| self.shifted(dcol, drow))
            .find(|candidate| !board.collides(candidate))
    }

    /// Number of rows the piece can fall before it rests on something.
    #[must_use]
    pub fn drop_distance(&self, board: &Board) -> i32 {
        let mut distance = 0;
        while !board.collides(&self.shifted(0, distance + 1)) {
            distance += 1;
        }
        distance
    }

    /// Returns the piece moved down as far as it can go.
    #[must_use]
    pub fn dropped(&self, board: &Board) -> Self {
        self.shifted(0, self.drop_distance(board))
    }
}
