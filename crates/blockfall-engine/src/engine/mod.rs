//! Session driving: sequencing, gravity, locking, scoring and mode hooks.
//!
//! - [`PieceSequencer`] - bag randomizer, lookahead queue and hold slot
//! - [`GameStats`] - score, level and clear statistics
//! - [`ModeStrategy`] / [`ModeConfig`] - the contract a game mode fulfils
//! - [`GameSession`] - one game, driven by [`GameSession::tick`] and player input
//! - [`Snapshot`] - serializable view of a session

pub use self::{mode::*, sequencer::*, session::*, snapshot::*, stats::*};

mod mode;
mod sequencer;
mod session;
mod snapshot;
mod stats;
