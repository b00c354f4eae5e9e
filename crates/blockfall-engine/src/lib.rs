//! Falling-block puzzle engine.
//!
//! - [`core`] holds the static and geometric parts: piece shapes, rotation,
//!   wall kicks and the board grid.
//! - [`engine`] drives a session: piece sequencing, hold, gravity, locking,
//!   scoring, leveling and the [`ModeStrategy`] hook contract.
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{ClassicRules, GameSession, Input, PieceSeed};
//! use rand::Rng as _;
//!
//! let seed: PieceSeed = rand::rng().random();
//! let mut session = GameSession::new(Box::new(ClassicRules), seed).unwrap();
//!
//! session.apply(Input::MoveLeft).ok();
//! session.apply(Input::HardDrop).unwrap();
//! session.tick(0);
//! session.tick(1_000);
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.next.len(), 3);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Invalid session configuration, reported by [`GameSession::new`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board dimensions must be positive, got {rows}x{cols}")]
    InvalidBoardSize { rows: usize, cols: usize },
    #[display("initial board is {actual_rows}x{actual_cols}, expected {rows}x{cols}")]
    InitialBoardMismatch {
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },
    #[display("piece bag must contain at least one kind")]
    EmptyBag,
    #[display("lookahead must be at least 1")]
    ZeroLookahead,
    #[display("starting level must be at least 1")]
    ZeroStartingLevel,
    #[display("score multiplier must be positive and finite, got {multiplier}")]
    InvalidScoreMultiplier { multiplier: f64 },
    #[display("time limit must be positive")]
    ZeroTimeLimit,
}

/// Rejected player action. The session is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ActionError {
    #[display("piece is blocked")]
    Blocked,
    #[display("session is paused")]
    Paused,
    #[display("session is over")]
    GameOver,
    #[display("hold already used for this piece")]
    HoldUsed,
    #[display("hold is disabled in this mode")]
    HoldDisabled,
}

/// Malformed textual board.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardParseError {
    #[display("board has no cells")]
    Empty,
    #[display("invalid cell '{c}' in row {row}")]
    InvalidCell { row: usize, c: char },
    #[display("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
