use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{BoardParseError, ConfigError};

use super::{piece::ActivePiece, shape::PieceKind};

/// A single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::IsVariant)]
pub enum Cell {
    #[default]
    Empty,
    /// Locked block of a specific piece kind.
    Block(PieceKind),
    /// Pre-filled or garbage block not owned by any piece kind.
    Garbage,
}

impl Cell {
    /// Character used by the textual board format.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Block(kind) => kind.as_char(),
            Cell::Garbage => '#',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Empty),
            '#' => Some(Cell::Garbage),
            _ => match PieceKind::from_char(c) {
                Some(kind) => Some(Cell::Block(kind)),
                None => None,
            },
        }
    }
}

/// The playfield grid.
///
/// Row 0 is the topmost row and column 0 the leftmost. Pieces may extend
/// above row 0; those cells are never tested for occupancy and are discarded
/// when the piece locks.
///
/// # Textual format
///
/// Each row is a string with one character per cell: `.` for empty, `#` for
/// garbage and the piece letter for locked blocks. Serde uses this format
/// (a list of row strings), as does [`Board::from_rows`].
///
/// # Example
///
/// ```
/// use blockfall_engine::{ActivePiece, Board, PieceKind};
///
/// let mut board = Board::new(20, 10).unwrap();
/// let piece = ActivePiece::spawn(PieceKind::O, board.cols());
/// assert!(!board.collides(&piece));
///
/// board.lock(&piece);
/// assert_eq!(board.filled_cell_count(), 4);
/// assert!(board.collides(&piece));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cols: usize,
    rows: Vec<Vec<Cell>>,
}

impl Board {
    pub const DEFAULT_ROWS: usize = 20;
    pub const DEFAULT_COLS: usize = 10;

    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidBoardSize { rows, cols });
        }
        Ok(Self {
            cols,
            rows: vec![vec![Cell::Empty; cols]; rows],
        })
    }

    /// Parses a board from row strings in the textual format.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, BoardParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let cells = row
                .as_ref()
                .chars()
                .map(|c| Cell::from_char(c).ok_or(BoardParseError::InvalidCell { row: index, c }))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(first) = parsed.first().map(Vec::len)
                && cells.len() != first
            {
                return Err(BoardParseError::RaggedRow {
                    row: index,
                    expected: first,
                    actual: cells.len(),
                });
            }
            parsed.push(cells);
        }
        let cols = parsed.first().map_or(0, Vec::len);
        if cols == 0 {
            return Err(BoardParseError::Empty);
        }
        Ok(Self { cols, rows: parsed })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the cell at (`row`, `col`), or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row)?.get(col).copied()
    }

    /// Overwrites a single cell.
    ///
    /// # Panics
    ///
    /// Panics if (`row`, `col`) is outside the grid.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.rows[row][col] = cell;
    }

    /// Iterates over the rows from top to bottom.
    pub fn row_cells(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    #[must_use]
    pub fn filled_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled_cell_count() == 0
    }

    /// Returns whether `piece` overlaps a wall, the floor or a filled cell.
    ///
    /// Cells above the top row only fail the column bounds check.
    #[must_use]
    pub fn collides(&self, piece: &ActivePiece) -> bool {
        piece.cells().any(|(row, col)| {
            let Ok(col) = usize::try_from(col) else {
                return true;
            };
            if col >= self.cols {
                return true;
            }
            let Ok(row) = usize::try_from(row) else {
                return false;
            };
            row >= self.rows.len() || !self.rows[row][col].is_empty()
        })
    }

    /// Writes the piece's footprint into the grid.
    ///
    /// Cells above the top row are dropped. The caller must have checked that
    /// the piece does not collide.
    pub fn lock(&mut self, piece: &ActivePiece) {
        for (row, col) in piece.cells() {
            let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
                continue;
            };
            if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
                *cell = Cell::Block(piece.kind());
            }
        }
    }

    /// Removes every full row and returns how many were removed.
    ///
    /// Rows are compacted bottom-up in a single pass, so non-adjacent full
    /// rows are handled together. Empty rows are inserted at the top.
    pub fn clear_full_lines(&mut self) -> usize {
        let mut count = 0;
        for y in (0..self.rows.len()).rev() {
            if is_full(&self.rows[y]) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows.swap(y, y + count);
            }
        }
        for row in &mut self.rows[..count] {
            row.fill(Cell::Empty);
        }
        count
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(Cell::Empty);
        }
    }

    /// Pushes `lines` garbage rows in from the bottom, each with one empty
    /// cell at `hole_col`.
    ///
    /// Existing rows move up. Returns `true` if any filled cell was pushed
    /// off the top of the board.
    pub fn push_garbage(&mut self, lines: usize, hole_col: usize) -> bool {
        let lines = lines.min(self.rows.len());
        let overflowed = self.rows[..lines]
            .iter()
            .any(|row| row.iter().any(|cell| !cell.is_empty()));
        self.rows.drain(..lines);
        let hole_col = hole_col % self.cols;
        for _ in 0..lines {
            let mut row = vec![Cell::Garbage; self.cols];
            row[hole_col] = Cell::Empty;
            self.rows.push(row);
        }
        overflowed
    }
}

fn is_full(row: &[Cell]) -> bool {
    row.iter().all(|cell| !cell.is_empty())
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_char()).collect::<String>())
            .collect::<Vec<_>>();
        rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        Board::from_rows(&rows).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::Rotation;

    use super::*;

    fn fill_row(board: &mut Board, row: usize) {
        for col in 0..board.cols() {
            board.set_cell(row, col, Cell::Garbage);
        }
    }

    fn piece(kind: PieceKind, col: i32, row: i32, rotation: u8) -> ActivePiece {
        ActivePiece::new(kind, col, row, Rotation::new(rotation))
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(20, 10).unwrap();
        assert_eq!(board.rows(), 20);
        assert_eq!(board.cols(), 10);
        assert!(board.is_empty());
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert!(matches!(
            Board::new(0, 10),
            Err(ConfigError::InvalidBoardSize { rows: 0, cols: 10 })
        ));
        assert!(Board::new(20, 0).is_err());
    }

    #[test]
    fn test_collides_with_walls_and_floor() {
        let board = Board::new(20, 10).unwrap();
        // T occupies columns col..col+3 in spawn orientation
        assert!(!board.collides(&piece(PieceKind::T, 0, 0, 0)));
        assert!(board.collides(&piece(PieceKind::T, -1, 0, 0)));
        assert!(!board.collides(&piece(PieceKind::T, 7, 0, 0)));
        assert!(board.collides(&piece(PieceKind::T, 8, 0, 0)));
        // bottom row of T spawn shape is row offset 1
        assert!(!board.collides(&piece(PieceKind::T, 3, 18, 0)));
        assert!(board.collides(&piece(PieceKind::T, 3, 19, 0)));
    }

    #[test]
    fn test_cells_above_top_are_not_checked_for_occupancy() {
        let mut board = Board::new(20, 10).unwrap();
        fill_row(&mut board, 0);
        // I in spawn orientation sits on its second grid row
        assert!(!board.collides(&piece(PieceKind::I, 3, -2, 0)));
        assert!(board.collides(&piece(PieceKind::I, 3, -1, 0)));
        // still bounded horizontally
        assert!(board.collides(&piece(PieceKind::I, 7, -2, 0)));
    }

    #[test]
    fn test_collides_matches_cell_law() {
        let mut board = Board::new(6, 5).unwrap();
        board.set_cell(5, 0, Cell::Garbage);
        board.set_cell(4, 2, Cell::Block(PieceKind::S));
        board.set_cell(2, 4, Cell::Garbage);
        for kind in PieceKind::ALL {
            for rotation in Rotation::ALL {
                for col in -4..8 {
                    for row in -4..9 {
                        let p = ActivePiece::new(kind, col, row, rotation);
                        let expected = p.cells().any(|(r, c)| {
                            c < 0
                                || c >= 5
                                || r >= 6
                                || (r >= 0
                                    && !board.cell(r as usize, c as usize).unwrap().is_empty())
                        });
                        assert_eq!(board.collides(&p), expected, "{p:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_lock_drops_cells_above_top() {
        let mut board = Board::new(20, 10).unwrap();
        // vertical I spanning rows -2..=1
        board.lock(&piece(PieceKind::I, 0, -2, 1));
        assert_eq!(board.filled_cell_count(), 2);
        assert_eq!(board.cell(0, 2), Some(Cell::Block(PieceKind::I)));
        assert_eq!(board.cell(1, 2), Some(Cell::Block(PieceKind::I)));
    }

    #[test]
    fn test_clear_single_bottom_line() {
        let mut board = Board::new(20, 10).unwrap();
        fill_row(&mut board, 19);
        board.set_cell(18, 3, Cell::Block(PieceKind::T));

        assert_eq!(board.clear_full_lines(), 1);
        assert_eq!(board.cell(19, 3), Some(Cell::Block(PieceKind::T)));
        assert_eq!(board.filled_cell_count(), 1);
    }

    #[test]
    fn test_clear_non_adjacent_lines() {
        let mut board = Board::from_rows([
            "..........",
            "....T.....",
            "##########",
            "#.#.#.#.#.",
            "##########",
        ])
        .unwrap();

        assert_eq!(board.clear_full_lines(), 2);
        let expected = Board::from_rows([
            "..........",
            "..........",
            "..........",
            "....T.....",
            "#.#.#.#.#.",
        ])
        .unwrap();
        assert_eq!(board, expected);
    }

    #[test]
    fn test_clear_conservation() {
        let mut board = Board::from_rows([
            "##.#######",
            "##########",
            "#.#.#.#.#.",
            "##########",
            "##########",
            ".........#",
        ])
        .unwrap();
        let before = board.filled_cell_count();
        let rows = board.rows();

        let cleared = board.clear_full_lines();

        assert_eq!(cleared, 3);
        assert_eq!(board.rows(), rows);
        assert_eq!(board.filled_cell_count() + cleared * board.cols(), before);
        assert!(board.row_cells().all(|row| !is_full(row)));
    }

    #[test]
    fn test_clear_all_rows() {
        let mut board = Board::new(4, 3).unwrap();
        for row in 0..4 {
            fill_row(&mut board, row);
        }
        assert_eq!(board.clear_full_lines(), 4);
        assert!(board.is_empty());
    }

    #[test]
    fn test_push_garbage() {
        let mut board = Board::from_rows(["....", "....", "..T.", "TTT."]).unwrap();

        let overflowed = board.push_garbage(2, 1);

        assert!(!overflowed);
        let expected = Board::from_rows(["..T.", "TTT.", "#.##", "#.##"]).unwrap();
        assert_eq!(board, expected);
    }

    #[test]
    fn test_push_garbage_reports_overflow() {
        let mut board = Board::from_rows(["O...", "....", "...."]).unwrap();
        assert!(board.push_garbage(1, 0));
        assert_eq!(board.rows(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Board::from_rows(["...", ".."]),
            Err(BoardParseError::RaggedRow { row: 1, expected: 3, actual: 2 })
        ));
        assert!(matches!(
            Board::from_rows([".x."]),
            Err(BoardParseError::InvalidCell { row: 0, c: 'x' })
        ));
        assert!(matches!(
            Board::from_rows(Vec::<String>::new()),
            Err(BoardParseError::Empty)
        ));
    }

    #[test]
    fn test_board_serialization() {
        let board = Board::from_rows(["..I", "#.."]).unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r##"["..I","#.."]"##);
        let parsed: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
        assert!(serde_json::from_str::<Board>(r#"["..","..."]"#).is_err());
    }
}
