//! Perpetual check and perpetual chase detection.
//!
//! Every move is classified as a check, a chase of an enemy piece, or
//! anything else. Repeating the same check or chase into the same
//! resulting position too many times is forbidden, except that the king
//! and pawns may chase forever.

mod action;


pub use action::{Action, ActionDetails, ActionHistory, ActionKind, TargetKey};

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::Board;
use crate::rules::{is_king_in_check, is_square_protected, pseudo_legal_moves};
use crate::xiangqi_move::XiangqiMove;

/// Prior identical actions needed before one more is forbidden.
pub const REPETITION_COUNT: usize = 3;
/// Oldest actions are dropped beyond this length.
pub const MAX_ACTION_HISTORY_LENGTH: usize = 60;

/// Classifies `mv` as played on `board_before`. The caller's board is not
/// touched.
pub fn action_kind_of(board_before: &Board, mv: &XiangqiMove) -> ActionDetails {
    let mut board = board_before.clone();
    let (_, mover) = mv.piece;
    let opponent = mover.opposite();

    if mv.apply(&mut board).is_err() {
        return ActionDetails::other(board.to_key());
    }
    let board_after = board.to_key();

    if let Some(king) = board.find_king(opponent) {
        if is_king_in_check(&board, opponent) {
            return ActionDetails {
                kind: ActionKind::Check,
                target: TargetKey::King { square: king },
                board_after,
            };
        }
    }

    let chased = pseudo_legal_moves(&board, mv.to)
        .into_iter()
        .find_map(|threat| match board.get(threat.to) {
            Some((piece, color)) if color == opponent && piece != Piece::King => {
                Some((threat.to, (piece, color)))
            }
            _ => None,
        });

    match chased {
        Some((square, target)) => {
            // protected means the chased piece could be recaptured by its
            // own side if taken
            let kind = if is_square_protected(&board, square, opponent) {
                ActionKind::ChaseProtected
            } else {
                ActionKind::ChaseUnprotected
            };
            ActionDetails {
                kind,
                target: TargetKey::Chase {
                    target,
                    at: square,
                    by: mv.piece,
                    from: mv.from,
                },
                board_after,
            }
        }
        None => ActionDetails::other(board_after),
    }
}

/// Whether playing an action with `details` now would be a forbidden
/// perpetual action by `mover`.
pub fn is_forbidden_repetition(
    mover: Color,
    mv: &XiangqiMove,
    details: &ActionDetails,
    history: &ActionHistory,
) -> bool {
    match details.kind {
        ActionKind::Other => return false,
        ActionKind::ChaseProtected | ActionKind::ChaseUnprotected => {
            let (piece, _) = mv.piece;
            if matches!(piece, Piece::King | Piece::Pawn) {
                return false;
            }
        }
        ActionKind::Check => {}
    }

    let count = history
        .iter()
        .filter(|action| {
            action.player == mover
                && action.kind == details.kind
                && action.target == details.target
                && action.board_after == details.board_after
        })
        .count();
    count >= REPETITION_COUNT
}
