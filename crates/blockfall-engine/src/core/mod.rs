//! Piece geometry and the board grid.
//!
//! - [`PieceKind`] / [`Shape`] - the seven pieces and their occupancy grids
//! - [`rotate`] - pure clockwise rotation from the canonical orientation
//! - [`ActivePiece`] - a positioned piece, with wall-kick rotation
//! - [`Board`] - collision, locking and line clearing

pub use self::{board::*, piece::*, shape::*};

mod board;
mod piece;
mod shape;
