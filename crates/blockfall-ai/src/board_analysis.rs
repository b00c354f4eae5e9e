use std::{cell::OnceCell, iter};

use blockfall_engine::{ActivePiece, Board};

/// Lazily computed surface and hole statistics of a board.
///
/// Heights count from the floor: an empty column has height 0 and a column
/// filled up to the top row has height `rows`.
#[derive(Debug)]
pub struct BoardAnalysis {
    board: Board,
    column_heights: OnceCell<Vec<u16>>,
    column_occupied_cells: OnceCell<Vec<u16>>,
    column_well_depths: OnceCell<Vec<u16>>,
    max_height: OnceCell<u16>,
    total_height: OnceCell<u32>,
    num_holes: OnceCell<u32>,
    row_transitions: OnceCell<u32>,
    column_transitions: OnceCell<u32>,
    surface_bumpiness: OnceCell<u32>,
}

impl BoardAnalysis {
    #[must_use]
    pub fn from_board(board: &Board) -> Self {
        Self {
            board: board.clone(),
            column_heights: OnceCell::new(),
            column_occupied_cells: OnceCell::new(),
            column_well_depths: OnceCell::new(),
            max_height: OnceCell::new(),
            total_height: OnceCell::new(),
            num_holes: OnceCell::new(),
            row_transitions: OnceCell::new(),
            column_transitions: OnceCell::new(),
            surface_bumpiness: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.board.cell(row, col).is_some_and(|cell| !cell.is_empty())
    }

    #[must_use]
    pub fn column_heights(&self) -> &[u16] {
        self.column_heights.get_or_init(|| {
            let rows = self.board.rows();
            (0..self.board.cols())
                .map(|col| {
                    (0..rows)
                        .find(|&row| self.is_occupied(row, col))
                        .map_or(0, |top| to_u16(rows - top))
                })
                .collect()
        })
    }

    #[must_use]
    pub fn column_occupied_cells(&self) -> &[u16] {
        self.column_occupied_cells.get_or_init(|| {
            (0..self.board.cols())
                .map(|col| {
                    to_u16(
                        (0..self.board.rows())
                            .filter(|&row| self.is_occupied(row, col))
                            .count(),
                    )
                })
                .collect()
        })
    }

    /// Depth of each column below the lower of its neighbours. Walls count as
    /// infinitely high.
    #[must_use]
    pub fn column_well_depths(&self) -> &[u16] {
        self.column_well_depths.get_or_init(|| {
            let h = self.column_heights();
            (0..h.len())
                .map(|col| {
                    let left = col.checked_sub(1).map_or(u16::MAX, |c| h[c]);
                    let right = h.get(col + 1).copied().unwrap_or(u16::MAX);
                    let neighbour = u16::min(left, right);
                    if neighbour == u16::MAX {
                        0
                    } else {
                        neighbour.saturating_sub(h[col])
                    }
                })
                .collect()
        })
    }

    #[must_use]
    pub fn max_height(&self) -> u16 {
        *self
            .max_height
            .get_or_init(|| self.column_heights().iter().copied().max().unwrap_or(0))
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        *self
            .total_height
            .get_or_init(|| self.column_heights().iter().copied().map(u32::from).sum())
    }

    /// Empty cells with a filled cell somewhere above them.
    #[must_use]
    pub fn num_holes(&self) -> u32 {
        *self.num_holes.get_or_init(|| {
            iter::zip(self.column_heights(), self.column_occupied_cells())
                .map(|(h, occ)| u32::from(h - occ))
                .sum()
        })
    }

    #[must_use]
    pub fn row_transitions(&self) -> u32 {
        *self.row_transitions.get_or_init(|| {
            let mut transitions = 0;
            for cells in self.board.row_cells() {
                for pair in cells.windows(2) {
                    if pair[0].is_empty() != pair[1].is_empty() {
                        transitions += 1;
                    }
                }
            }
            transitions
        })
    }

    #[must_use]
    pub fn column_transitions(&self) -> u32 {
        *self.column_transitions.get_or_init(|| {
            let mut transitions = 0;
            for col in 0..self.board.cols() {
                let mut prev_occupied = self.is_occupied(0, col);
                for row in 1..self.board.rows() {
                    let occupied = self.is_occupied(row, col);
                    if occupied != prev_occupied {
                        transitions += 1;
                    }
                    prev_occupied = occupied;
                }
            }
            transitions
        })
    }

    /// Sum of height differences between adjacent columns.
    #[must_use]
    pub fn surface_bumpiness(&self) -> u32 {
        *self.surface_bumpiness.get_or_init(|| {
            self.column_heights()
                .windows(2)
                .map(|w| u32::from(w[0].abs_diff(w[1])))
                .sum()
        })
    }

    /// Deepest well on either wall, where an I-piece can score a Tetris.
    #[must_use]
    pub fn edge_well_depth(&self) -> u16 {
        let depths = self.column_well_depths();
        let first = depths.first().copied().unwrap_or(0);
        let last = depths.last().copied().unwrap_or(0);
        u16::max(first, last)
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// The board after locking a placement and clearing lines.
#[derive(Debug)]
pub struct PlacementAnalysis {
    placement: ActivePiece,
    cleared_lines: usize,
    board_analysis: BoardAnalysis,
}

impl PlacementAnalysis {
    #[must_use]
    pub fn from_board(board: &Board, placement: ActivePiece) -> Self {
        let mut board = board.clone();
        board.lock(&placement);
        let cleared_lines = board.clear_full_lines();

        Self {
            placement,
            cleared_lines,
            board_analysis: BoardAnalysis::from_board(&board),
        }
    }

    #[must_use]
    pub fn placement(&self) -> &ActivePiece {
        &self.placement
    }

    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    #[must_use]
    pub fn board_analysis(&self) -> &BoardAnalysis {
        &self.board_analysis
    }
}
