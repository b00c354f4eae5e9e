//! Game mode strategies for the blockfall engine.
//!
//! Every mode is a [`ModeStrategy`](blockfall_engine::ModeStrategy): it hands
//! the session a [`ModeConfig`](blockfall_engine::ModeConfig) once and reacts
//! to lifecycle hooks through a [`ModeControl`](blockfall_engine::ModeControl).
//!
//! - [`ClassicMode`]: marathon rules
//! - [`SpeedMode`]: score attack against the clock with accelerating gravity
//! - [`BattleRules`] and [`BattleMatch`]: two sessions exchanging garbage
//! - [`PuzzleMode`]: preset boards with a piece allowance
//! - [`AdventureMode`]: stages with their own objectives
//! - [`ZenMode`]: slow gravity and no game over
//!
//! [`PuzzleProgress`] and [`AdventureProgress`] track what the player has
//! unlocked between sessions.
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{EndReason, GameSession, PieceSeed};
//! use blockfall_modes::{PUZZLES, PuzzleMode, PuzzleProgress};
//!
//! let mut progress = PuzzleProgress::default();
//! let mode = PuzzleMode::new(progress.current())?;
//! let mut session = GameSession::new(Box::new(mode), PieceSeed::from_bytes([0; 16]))?;
//!
//! session.move_right()?;
//! session.move_right()?;
//! session.hard_drop()?;
//! assert_eq!(session.end_reason(), Some(EndReason::Objective));
//!
//! assert!(progress.record_solved(PUZZLES[0].id));
//! progress.select(PUZZLES[1].id)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    adventure::*, battle::*, battle_match::*, classic::*, progress::*, puzzle::*, speed::*, zen::*,
};

mod adventure;
mod battle;
mod battle_match;
mod classic;
mod progress;
mod puzzle;
mod speed;
mod zen;

/// A mode option given as text that names no known choice.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum OptionError {
    #[display("unsupported time limit {seconds}s, expected one of 60, 120, 180, 300")]
    UnsupportedTimeLimit { seconds: u64 },
    #[display("unknown opponent '{name}'")]
    UnknownOpponent { name: String },
}
