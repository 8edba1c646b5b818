//! Rules of play as pure functions over a `Board`.
//!
//! Nothing here keeps state between calls. Functions that need to try a
//! move on a hypothetical board work on a scratch copy (or apply and undo
//! in place on a board they own), so the caller's board is never observed
//! in a modified state.

mod move_generation;


pub use move_generation::{count_between, pseudo_legal_moves, pseudo_legal_moves_for};

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::square::Square;
use crate::board::Board;
use crate::xiangqi_move::{MoveList, XiangqiMove};
use move_generation::piece_reaches;

/// Number of times a (position, mover) pair must occur to end the game.
pub const REPETITION_LIMIT: usize = 3;

pub fn find_king(board: &Board, color: Color) -> Option<Square> {
    board.find_king(color)
}

/// True if any piece of `by_color` has a pseudo-legal move landing on
/// `target`. A king additionally attacks every square it can see down
/// an open file, which is how a flying-general check is detected.
pub fn is_square_attacked(board: &Board, target: Square, by_color: Color) -> bool {
    board.pieces_of(by_color).any(|(from, piece)| {
        if piece == Piece::King
            && from.col == target.col
            && from != target
            && count_between(board, from, target) == 0
        {
            return true;
        }
        piece_reaches(board, from, piece, by_color, target)
    })
}

/// True if, were the piece on `target` captured by an enemy, another piece
/// of `color` could legally recapture on `target`. A king never counts as
/// the protector of its own king's square.
pub fn is_square_protected(board: &Board, target: Square, color: Color) -> bool {
    let target_is_king = matches!(board.get(target), Some((Piece::King, c)) if c == color);

    // stand in an enemy piece as the capturer so recaptures become
    // pseudo-legal moves onto `target`
    let mut scratch = board.clone();
    scratch.remove(target);
    if scratch
        .put(target, Piece::Chariot, color.opposite())
        .is_err()
    {
        return false;
    }

    let protectors: Vec<(Square, Piece)> = scratch
        .pieces_of(color)
        .filter(|&(_, piece)| !(target_is_king && piece == Piece::King))
        .collect();

    protectors.into_iter().any(|(from, piece)| {
        if !piece_reaches(&scratch, from, piece, color, target) {
            return false;
        }
        let captured = scratch.apply_move(from, target).ok().flatten();
        let safe = !is_king_in_check(&scratch, color) && !generals_facing(&scratch);
        scratch.undo_move(from, target, (piece, color), captured);
        safe
    })
}

/// A missing king counts as in check: the side has already lost.
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king) => is_square_attacked(board, king, color.opposite()),
        None => true,
    }
}

/// Both kings on one file with nothing between them. A board missing
/// either king is never "facing".
pub fn generals_facing(board: &Board) -> bool {
    match (board.find_king(Color::Red), board.find_king(Color::Black)) {
        (Some(red), Some(black)) => red.col == black.col && count_between(board, red, black) == 0,
        _ => false,
    }
}

/// Whether `mv` would leave `color`'s king safe. The board is restored
/// before returning.
pub fn leaves_king_safe(board: &mut Board, mv: &XiangqiMove) -> bool {
    let (_, color) = mv.piece;
    let captured = match mv.apply(board) {
        Ok(captured) => captured,
        Err(_) => return false,
    };
    let safe = !is_king_in_check(board, color) && !generals_facing(board);
    mv.undo(board, captured);
    safe
}

/// Pseudo-legal moves that neither leave the mover in check nor bring
/// the kings face to face.
pub fn legal_moves(board: &Board, color: Color) -> MoveList {
    let mut scratch = board.clone();
    pseudo_legal_moves_for(board, color)
        .into_iter()
        .filter(|mv| leaves_king_safe(&mut scratch, mv))
        .collect()
}

/// Whether a specific move is legal for the side that owns the piece.
pub fn is_legal_move(board: &Board, mv: &XiangqiMove) -> bool {
    let (_, color) = mv.piece;
    board.get(mv.from) == Some(mv.piece) && legal_moves(board, color).contains(mv)
}

pub fn has_legal_move(board: &Board, color: Color) -> bool {
    let mut scratch = board.clone();
    pseudo_legal_moves_for(board, color)
        .iter()
        .any(|mv| leaves_king_safe(&mut scratch, mv))
}

/// Returns whether `color` is checkmated and, if so, the winner.
pub fn is_checkmate(board: &Board, color: Color) -> (bool, Option<Color>) {
    if is_king_in_check(board, color) && !has_legal_move(board, color) {
        (true, Some(color.opposite()))
    } else {
        (false, None)
    }
}

/// No legal move while not in check. This is scored as a draw.
pub fn is_stalemate(board: &Board, color: Color) -> bool {
    !is_king_in_check(board, color) && !has_legal_move(board, color)
}

/// True if the (position, mover) pair occurs at least `REPETITION_LIMIT`
/// times in `history`.
pub fn check_threefold_repetition(board_key: u64, mover: Color, history: &[(u64, Color)]) -> bool {
    history
        .iter()
        .filter(|&&(key, color)| key == board_key && color == mover)
        .count()
        >= REPETITION_LIMIT
}
