//! Pseudo-legal move generation: piece geometry only, ignoring whether
//! the mover's own king is left exposed.

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::square::Square;
use crate::board::Board;
use crate::xiangqi_move::{MoveList, XiangqiMove};

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

// (destination offset, leg offset) for each horse jump
const HORSE_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((-2, -1), (-1, 0)),
    ((-2, 1), (-1, 0)),
    ((2, -1), (1, 0)),
    ((2, 1), (1, 0)),
    ((-1, -2), (0, -1)),
    ((1, -2), (0, -1)),
    ((-1, 2), (0, 1)),
    ((1, 2), (0, 1)),
];

/// All geometrically valid moves for the piece on `from`. An empty square
/// yields no moves.
pub fn pseudo_legal_moves(board: &Board, from: Square) -> MoveList {
    let mut moves = MoveList::new();
    if let Some((piece, color)) = board.get(from) {
        generate_piece_moves(board, from, piece, color, &mut moves);
    }
    moves
}

/// Pseudo-legal moves for every piece of `color`.
pub fn pseudo_legal_moves_for(board: &Board, color: Color) -> MoveList {
    let mut moves = MoveList::new();
    for (from, piece) in board.pieces_of(color) {
        generate_piece_moves(board, from, piece, color, &mut moves);
    }
    moves
}

pub(crate) fn generate_piece_moves(
    board: &Board,
    from: Square,
    piece: Piece,
    color: Color,
    moves: &mut MoveList,
) {
    match piece {
        Piece::King => king_moves(board, from, color, moves),
        Piece::Advisor => advisor_moves(board, from, color, moves),
        Piece::Elephant => elephant_moves(board, from, color, moves),
        Piece::Horse => horse_moves(board, from, color, moves),
        Piece::Chariot => chariot_moves(board, from, color, moves),
        Piece::Cannon => cannon_moves(board, from, color, moves),
        Piece::Pawn => pawn_moves(board, from, color, moves),
    }
}

fn push_unless_own(
    board: &Board,
    from: Square,
    to: Square,
    piece: Piece,
    color: Color,
    moves: &mut MoveList,
) {
    match board.get(to) {
        Some((_, occupant)) if occupant == color => {}
        _ => moves.push(XiangqiMove::new(from, to, (piece, color))),
    }
}

fn king_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for (dr, dc) in ORTHOGONAL {
        if let Some(to) = from.offset(dr, dc) {
            if to.in_palace(color) {
                push_unless_own(board, from, to, Piece::King, color, moves);
            }
        }
    }

    // flying general: capture the enemy king straight down an open file
    if let Some(enemy_king) = board.find_king(color.opposite()) {
        if enemy_king.col == from.col && count_between(board, from, enemy_king) == 0 {
            moves.push(XiangqiMove::new(from, enemy_king, (Piece::King, color)));
        }
    }
}

fn advisor_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for (dr, dc) in DIAGONAL {
        if let Some(to) = from.offset(dr, dc) {
            if to.in_palace(color) {
                push_unless_own(board, from, to, Piece::Advisor, color, moves);
            }
        }
    }
}

fn elephant_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for (dr, dc) in DIAGONAL {
        let (Some(eye), Some(to)) = (from.offset(dr, dc), from.offset(2 * dr, 2 * dc)) else {
            continue;
        };
        if to.is_across_river(color) || board.is_occupied(eye) {
            continue;
        }
        push_unless_own(board, from, to, Piece::Elephant, color, moves);
    }
}

fn horse_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for ((dr, dc), (leg_r, leg_c)) in HORSE_JUMPS {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        let leg = Square::new(from.row + leg_r, from.col + leg_c);
        if board.is_occupied(leg) {
            continue;
        }
        push_unless_own(board, from, to, Piece::Horse, color, moves);
    }
}

fn chariot_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for (dr, dc) in ORTHOGONAL {
        let mut current = from;
        while let Some(to) = current.offset(dr, dc) {
            match board.get(to) {
                None => moves.push(XiangqiMove::new(from, to, (Piece::Chariot, color))),
                Some((_, occupant)) => {
                    if occupant != color {
                        moves.push(XiangqiMove::new(from, to, (Piece::Chariot, color)));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn cannon_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    for (dr, dc) in ORTHOGONAL {
        let mut current = from;
        let mut screened = false;
        while let Some(to) = current.offset(dr, dc) {
            match (board.get(to), screened) {
                (None, false) => moves.push(XiangqiMove::new(from, to, (Piece::Cannon, color))),
                (None, true) => {}
                (Some(_), false) => screened = true,
                (Some((_, occupant)), true) => {
                    if occupant != color {
                        moves.push(XiangqiMove::new(from, to, (Piece::Cannon, color)));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn pawn_moves(board: &Board, from: Square, color: Color, moves: &mut MoveList) {
    if let Some(to) = from.offset(color.forward(), 0) {
        push_unless_own(board, from, to, Piece::Pawn, color, moves);
    }
    if from.is_across_river(color) {
        for dc in [-1, 1] {
            if let Some(to) = from.offset(0, dc) {
                push_unless_own(board, from, to, Piece::Pawn, color, moves);
            }
        }
    }
}

/// Number of pieces strictly between two squares on the same row or
/// column. Squares that do not share a line report `usize::MAX`.
pub fn count_between(board: &Board, a: Square, b: Square) -> usize {
    if a.row == b.row {
        let (lo, hi) = (a.col.min(b.col), a.col.max(b.col));
        ((lo + 1)..hi)
            .filter(|&col| board.piece_at(a.row, col).is_some())
            .count()
    } else if a.col == b.col {
        let (lo, hi) = (a.row.min(b.row), a.row.max(b.row));
        ((lo + 1)..hi)
            .filter(|&row| board.piece_at(row, a.col).is_some())
            .count()
    } else {
        usize::MAX
    }
}

/// Whether the piece on `from` has a pseudo-legal move onto `target`.
/// Cheaper than generating the full move list because most pieces are
/// rejected on geometry alone.
pub(crate) fn piece_reaches(
    board: &Board,
    from: Square,
    piece: Piece,
    color: Color,
    target: Square,
) -> bool {
    if from == target {
        return false;
    }
    let (dr, dc) = (target.row - from.row, target.col - from.col);
    let plausible = match piece {
        Piece::King | Piece::Chariot | Piece::Cannon => dr == 0 || dc == 0,
        Piece::Advisor => dr.abs() == 1 && dc.abs() == 1,
        Piece::Elephant => dr.abs() == 2 && dc.abs() == 2,
        Piece::Horse => dr.abs() + dc.abs() == 3 && dr != 0 && dc != 0,
        Piece::Pawn => dr.abs() + dc.abs() == 1,
    };
    if !plausible {
        return false;
    }
    let mut moves = MoveList::new();
    generate_piece_moves(board, from, piece, color, &mut moves);
    moves.iter().any(|mv| mv.to == target)
}
