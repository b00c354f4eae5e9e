use std::iter;

use arrayvec::ArrayVec;
use blockfall_engine::{ActivePiece, Board, GameSession, Input, RotationDirection};

use crate::{Features, PlacementAnalysis, WeightSet};

/// A placement together with the inputs that reach it from the spawn pose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPlan {
    pub use_hold: bool,
    /// Final resting pose.
    pub placement: ActivePiece,
    /// Inputs to apply in order, ending with [`Input::HardDrop`].
    pub inputs: Vec<Input>,
}

/// What the planner needs to know about a session.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub board: &'a Board,
    pub active: ActivePiece,
    /// Piece that becomes active after a hold, when holding is allowed.
    pub hold_piece: Option<ActivePiece>,
}

impl<'a> TurnContext<'a> {
    /// Reads the context from a playing session. Returns `None` when there is
    /// no active piece.
    #[must_use]
    pub fn from_session(session: &'a GameSession) -> Option<Self> {
        let board = session.board();
        let active = *session.active_piece()?;
        let hold_piece = session
            .can_hold()
            .then(|| session.held_piece().or_else(|| session.next_pieces().next()))
            .flatten()
            .and_then(|kind| ActivePiece::spawn(kind, board.cols()).kicked(board));
        Some(Self {
            board,
            active,
            hold_piece,
        })
    }
}

/// Chooses the best-scoring placement under a [`WeightSet`].
#[derive(Debug, Clone)]
pub struct TurnPlanner {
    weights: WeightSet,
}

impl TurnPlanner {
    #[must_use]
    pub fn new(weights: WeightSet) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    #[must_use]
    pub fn score(&self, board: &Board, placement: ActivePiece) -> f32 {
        let analysis = PlacementAnalysis::from_board(board, placement);
        self.weights.score(&Features::measure(&analysis))
    }

    #[must_use]
    pub fn select_best_turn(&self, context: &TurnContext<'_>) -> Option<TurnPlan> {
        let mut best_score = f32::MIN;
        let mut best_turn = None;

        for turn in available_turns(context) {
            let score = self.score(context.board, turn.placement);
            if score > best_score {
                best_score = score;
                best_turn = Some(turn);
            }
        }

        best_turn
    }
}

/// Every distinct placement reachable with rotations, shifts and a hard drop,
/// with and without hold.
pub fn available_turns<'a>(context: &TurnContext<'a>) -> impl Iterator<Item = TurnPlan> + use<'a> {
    let board = context.board;
    let mut starts = ArrayVec::<_, 2>::new();
    starts.push((false, context.active));
    if let Some(piece) = context.hold_piece {
        starts.push((true, piece));
    }
    starts.into_iter().flat_map(move |(use_hold, piece)| {
        available_placements(board, piece).map(move |(placement, mut inputs)| {
            if use_hold {
                inputs.insert(0, Input::Hold);
            }
            TurnPlan {
                use_hold,
                placement,
                inputs,
            }
        })
    })
}

fn available_placements(
    board: &Board,
    piece: ActivePiece,
) -> impl Iterator<Item = (ActivePiece, Vec<Input>)> + '_ {
    rotations(board, piece)
        .into_iter()
        .flat_map(move |(rotated, rotate_inputs)| {
            let left = iter::successors(move_left(rotated, board), move |p| move_left(*p, board))
                .enumerate()
                .map(|(i, p)| (p, Input::MoveLeft, i + 1));
            let right =
                iter::successors(move_right(rotated, board), move |p| move_right(*p, board))
                    .enumerate()
                    .map(|(i, p)| (p, Input::MoveRight, i + 1));
            iter::once((rotated, Input::MoveLeft, 0))
                .chain(left)
                .chain(right)
                .map(move |(shifted, shift, count)| {
                    let inputs: Vec<Input> = rotate_inputs
                        .iter()
                        .copied()
                        .chain(iter::repeat_n(shift, count))
                        .chain(iter::once(Input::HardDrop))
                        .collect();
                    (shifted.dropped(board), inputs)
                })
                .collect::<Vec<_>>()
        })
}

/// Poses reachable by rotating at the spawn position: zero to three clockwise
/// turns, plus one counter-clockwise turn. Duplicates are removed.
fn rotations(board: &Board, piece: ActivePiece) -> ArrayVec<(ActivePiece, ArrayVec<Input, 3>), 5> {
    let mut result = ArrayVec::new();
    result.push((piece, ArrayVec::new()));

    let mut current = piece;
    let mut inputs = ArrayVec::<Input, 3>::new();
    for _ in 0..3 {
        let Some(rotated) = current.rotated_with_kicks(board, RotationDirection::Clockwise) else {
            break;
        };
        current = rotated;
        inputs.push(Input::RotateCw);
        if result.iter().all(|(p, _)| *p != current) {
            result.push((current, inputs.clone()));
        }
    }

    if let Some(ccw) = piece.rotated_with_kicks(board, RotationDirection::CounterClockwise)
        && result.iter().all(|(p, _)| *p != ccw)
    {
        result.push((ccw, iter::once(Input::RotateCcw).collect()));
    }
    result
}

fn move_left(piece: ActivePiece, board: &Board) -> Option<ActivePiece> {
    Some(piece.left()).filter(|moved| !board.collides(moved))
}

fn move_right(piece: ActivePiece, board: &Board) -> Option<ActivePiece> {
    Some(piece.right()).filter(|moved| !board.collides(moved))
}
