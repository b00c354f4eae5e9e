use serde::{Deserialize, Serialize};

use crate::{ActivePiece, Board, PieceKind};

use super::mode::{EndReason, GameMode};

/// Read-only view of a session for renderers and CPU players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub game_mode: GameMode,
    pub board: Board,
    pub active: Option<ActivePiece>,
    /// Landing position of `active`.
    pub ghost: Option<ActivePiece>,
    pub next: Vec<PieceKind>,
    pub hold: Option<PieceKind>,
    pub can_hold: bool,
    pub score: u64,
    pub level: u32,
    pub lines: usize,
    pub paused: bool,
    pub game_over: bool,
    pub end_reason: Option<EndReason>,
    pub elapsed_ms: u64,
    pub remaining_ms: Option<u64>,
    pub pending_garbage: usize,
}
