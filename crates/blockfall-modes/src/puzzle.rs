use std::iter;

use blockfall_engine::{
    Board, BoardParseError, EndReason, GameMode, LineClear, ModeConfig, ModeControl, ModeStrategy,
    PieceKind,
};
use log::{debug, info};

/// A preset challenge: a pre-filled board, a restricted piece bag and a
/// piece allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Puzzle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub objective: &'static str,
    /// Bottom rows of the board in the textual board format; rows above
    /// them start empty.
    pub bottom_rows: &'static [&'static str],
    pub available_pieces: &'static [PieceKind],
    pub piece_limit: usize,
    pub target_lines: usize,
    /// Solved only by a Tetris, regardless of `target_lines`.
    pub require_tetris: bool,
}

impl Puzzle {
    /// The full starting board.
    pub fn board(&self) -> Result<Board, BoardParseError> {
        let cols = self
            .bottom_rows
            .first()
            .map_or(Board::DEFAULT_COLS, |row| row.chars().count());
        let empty = ".".repeat(cols);
        let padding = Board::DEFAULT_ROWS.saturating_sub(self.bottom_rows.len());
        let rows = iter::repeat_n(empty.as_str(), padding).chain(self.bottom_rows.iter().copied());
        Board::from_rows(rows)
    }
}

pub static PUZZLES: [Puzzle; 3] = [
    Puzzle {
        id: "pzl_1",
        name: "Simple Line",
        description: "Complete one line with a single I piece.",
        objective: "Clear 1 line",
        bottom_rows: &["######...."],
        available_pieces: &[PieceKind::I],
        piece_limit: 1,
        target_lines: 1,
        require_tetris: false,
    },
    Puzzle {
        id: "pzl_2",
        name: "L and J",
        description: "Fill the gap with an L or a J piece.",
        objective: "Clear 2 lines",
        bottom_rows: &["######.###", "######.###"],
        available_pieces: &[PieceKind::L, PieceKind::J],
        piece_limit: 2,
        target_lines: 2,
        require_tetris: false,
    },
    Puzzle {
        id: "pzl_3",
        name: "First Tetris",
        description: "Drop the I piece into the well for a Tetris.",
        objective: "Score a Tetris",
        bottom_rows: &[
            "#########.",
            "#########.",
            "#########.",
            "#########.",
        ],
        available_pieces: &[PieceKind::I],
        piece_limit: 1,
        target_lines: 4,
        require_tetris: true,
    },
];

/// Looks up a puzzle by id, returning it with its index in [`PUZZLES`].
#[must_use]
pub fn find_puzzle(id: &str) -> Option<(usize, &'static Puzzle)> {
    PUZZLES.iter().enumerate().find(|(_, p)| p.id == id)
}

/// Plays one [`Puzzle`].
///
/// The session finishes with [`EndReason::Objective`] when the puzzle is
/// solved, and with [`EndReason::OutOfPieces`] when a piece spawns beyond
/// the allowance. Hold is disabled and only the next piece is shown.
#[derive(Debug, Clone)]
pub struct PuzzleMode {
    puzzle: &'static Puzzle,
    board: Board,
    used_pieces: usize,
    total_lines: usize,
    solved: bool,
}

impl PuzzleMode {
    pub fn new(puzzle: &'static Puzzle) -> Result<Self, BoardParseError> {
        Ok(Self {
            board: puzzle.board()?,
            puzzle,
            used_pieces: 0,
            total_lines: 0,
            solved: false,
        })
    }

    #[must_use]
    pub fn puzzle(&self) -> &'static Puzzle {
        self.puzzle
    }

    #[must_use]
    pub fn used_pieces(&self) -> usize {
        self.used_pieces
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.solved
    }
}

impl ModeStrategy for PuzzleMode {
    fn config(&self) -> ModeConfig {
        ModeConfig::new(GameMode::Puzzle)
            .with_initial_board(self.board.clone())
            .with_bag(self.puzzle.available_pieces.to_vec())
            .with_hold_enabled(false)
            .with_lookahead(1)
    }

    fn on_game_start(&mut self, _control: &mut ModeControl) {
        self.used_pieces = 0;
        self.total_lines = 0;
        self.solved = false;
        info!("puzzle {} ({})", self.puzzle.id, self.puzzle.objective);
    }

    fn on_piece_spawned(&mut self, _kind: PieceKind, control: &mut ModeControl) {
        self.used_pieces += 1;
        if self.used_pieces > self.puzzle.piece_limit {
            debug!("puzzle {} ran out of pieces", self.puzzle.id);
            control.finish(EndReason::OutOfPieces);
        }
    }

    fn on_line_cleared(&mut self, clear: &LineClear, control: &mut ModeControl) {
        self.total_lines = clear.total_lines;
        let solved = if self.puzzle.require_tetris {
            clear.is_tetris
        } else {
            clear.total_lines >= self.puzzle.target_lines
        };
        if solved {
            info!("puzzle {} solved", self.puzzle.id);
            self.solved = true;
            control.finish(EndReason::Objective);
        }
    }

    fn progress(&self) -> Option<String> {
        Some(format!(
            "{}/{} pieces, {}/{} lines",
            self.used_pieces.min(self.puzzle.piece_limit),
            self.puzzle.piece_limit,
            self.total_lines,
            self.puzzle.target_lines
        ))
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{GameSession, PieceSeed};

    use super::*;

    fn start(index: usize, seed: u8) -> GameSession {
        let mode = PuzzleMode::new(&PUZZLES[index]).unwrap();
        GameSession::new(Box::new(mode), PieceSeed::from_bytes([seed; 16])).unwrap()
    }

    #[test]
    fn test_puzzle_boards() {
        for puzzle in &PUZZLES {
            let board = puzzle.board().unwrap();
            assert_eq!((board.rows(), board.cols()), (20, 10), "{}", puzzle.id);
        }
        let board = PUZZLES[0].board().unwrap();
        assert_eq!(board.filled_cell_count(), 6);
        assert_eq!(PUZZLES[2].board().unwrap().filled_cell_count(), 36);
    }

    #[test]
    fn test_puzzle_config() {
        let config = PuzzleMode::new(&PUZZLES[1]).unwrap().config();
        assert_eq!(config.game_mode, GameMode::Puzzle);
        assert!(!config.hold_enabled);
        assert_eq!(config.lookahead, 1);
        assert_eq!(config.bag, vec![PieceKind::L, PieceKind::J]);
        assert!(config.initial_board.is_some());
    }

    #[test]
    fn test_single_line_puzzle_is_solved() {
        let mut session = start(0, 1);
        session.move_right().unwrap();
        session.move_right().unwrap();
        session.hard_drop().unwrap();
        assert_eq!(session.end_reason(), Some(EndReason::Objective));
        assert_eq!(session.stats().total_lines(), 1);
        assert_eq!(
            session.mode().progress().as_deref(),
            Some("1/1 pieces, 1/1 lines")
        );
    }

    #[test]
    fn test_running_out_of_pieces() {
        let mut session = start(0, 1);
        session.hard_drop().unwrap();
        assert_eq!(session.end_reason(), Some(EndReason::OutOfPieces));
        assert_eq!(session.stats().total_lines(), 0);
    }

    #[test]
    fn test_two_line_puzzle_with_either_piece() {
        for seed in 0..8 {
            let mut session = start(1, seed);
            // J stands with its foot to the right, L with its foot to the left
            match session.active_piece().unwrap().kind() {
                PieceKind::J => session.rotate_cw().unwrap(),
                PieceKind::L => session.rotate_ccw().unwrap(),
                other => panic!("unexpected {other}"),
            }
            session.move_right().unwrap();
            session.hard_drop().unwrap();
            assert_eq!(session.end_reason(), Some(EndReason::Objective), "seed {seed}");
            assert_eq!(session.stats().total_lines(), 2);
        }
    }

    #[test]
    fn test_tetris_puzzle_requires_tetris() {
        let mut session = start(2, 4);
        session.rotate_cw().unwrap();
        for _ in 0..3 {
            session.move_right().unwrap();
        }
        session.hard_drop().unwrap();
        assert_eq!(session.stats().tetrises(), 1);
        assert_eq!(session.end_reason(), Some(EndReason::Objective));
    }

    #[test]
    fn test_find_puzzle() {
        assert_eq!(find_puzzle("pzl_2").map(|(i, _)| i), Some(1));
        assert!(find_puzzle("pzl_9").is_none());
    }
}
