//! Individual evaluation terms. Each returns a score for one side, positive
//! when good for that side, except `piece_safety` which already nets both
//! sides from red's point of view.

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::square::Square;
use crate::board::Board;
use crate::rules::{is_square_attacked, is_square_protected, pseudo_legal_moves};

use super::{opening_value, relative_row, CHECKMATE_SCORE};

const MOBILITY_WEIGHT: f64 = 2.0;
const PIECE_SAFETY_PENALTY_FACTOR: f64 = 0.6;
const STRATEGIC_FORMATION_BONUS: f64 = 50.0;

const ADVISOR_BONUS: f64 = 30.0;
const ELEPHANT_BONUS: f64 = 25.0;
const MISSING_ADVISOR_PENALTY: f64 = 50.0;
const MISSING_ELEPHANT_PENALTY: f64 = 40.0;
const PALACE_ATTACK_PENALTY: f64 = 30.0;
const KING_ATTACK_PENALTY: f64 = 100.0;

const CANNON_MOUNT_BONUS: f64 = 15.0;
const CANNON_KING_MOUNT_BONUS: f64 = 10.0;

const ENEMY_TERRITORY_BONUS: f64 = 15.0;
const UNDEVELOPED_PENALTY: f64 = 5.0;
const HOME_PAWN_BONUS: f64 = 10.0;
const CONNECTED_PAWN_BONUS: f64 = 12.0;
const RIVER_BANK_BONUS: f64 = 8.0;

// Defender squares are written for red and mirrored for black.
const ADVISOR_HOME: [(i8, i8); 2] = [(9, 3), (9, 5)];
const ADVISOR_RAISED: (i8, i8) = (8, 4);
const ELEPHANT_HOME: [(i8, i8); 2] = [(9, 2), (9, 6)];
const ELEPHANT_RAISED: [(i8, i8); 3] = [(7, 0), (7, 4), (7, 8)];

fn own_square(row: i8, col: i8, color: Color) -> Square {
    match color {
        Color::Red => Square::new(row, col),
        Color::Black => Square::new(9 - row, col),
    }
}

fn holds(board: &Board, square: Square, piece: Piece, color: Color) -> bool {
    board.get(square) == Some((piece, color))
}

/// Rewards advisors and elephants around the king and penalizes attacked
/// palace squares near it. A missing king scores as a decisive loss.
pub fn king_safety(board: &Board, color: Color, _progress: f64) -> f64 {
    let Some(king) = board.find_king(color) else {
        return -2.0 * CHECKMATE_SCORE as f64;
    };

    let mut advisors = 0.0;
    for (r, c) in ADVISOR_HOME {
        if holds(board, own_square(r, c, color), Piece::Advisor, color) {
            advisors += 1.0;
        }
    }
    if holds(board, own_square(ADVISOR_RAISED.0, ADVISOR_RAISED.1, color), Piece::Advisor, color) {
        advisors += 0.5;
    }

    let mut elephants = 0.0;
    for (r, c) in ELEPHANT_HOME {
        if holds(board, own_square(r, c, color), Piece::Elephant, color) {
            elephants += 1.0;
        }
    }
    if ELEPHANT_RAISED
        .iter()
        .any(|&(r, c)| holds(board, own_square(r, c, color), Piece::Elephant, color))
    {
        elephants += 0.5;
    }

    let mut score: f64 = advisors * ADVISOR_BONUS + elephants * ELEPHANT_BONUS;
    if advisors < 2.0 {
        score -= (2.0 - advisors) * MISSING_ADVISOR_PENALTY;
    }
    if elephants < 2.0 {
        score -= (2.0 - elephants) * MISSING_ELEPHANT_PENALTY;
    }

    let opponent = color.opposite();
    for dr in -1..=1 {
        for dc in -1..=1 {
            let Some(square) = king.offset(dr, dc) else {
                continue;
            };
            if !square.in_palace(color) || !is_square_attacked(board, square, opponent) {
                continue;
            }
            score -= PALACE_ATTACK_PENALTY;
            if square == king {
                score -= KING_ATTACK_PENALTY;
            }
        }
    }

    score
}

fn mobility_weight(piece: Piece, progress: f64) -> Option<f64> {
    match piece {
        Piece::Chariot if progress >= 2.0 => Some(3.0),
        Piece::Chariot => Some(2.5),
        Piece::Horse => Some(1.8),
        Piece::Cannon => Some(1.5),
        _ => None,
    }
}

/// Weighted count of the squares the attacking pieces can reach.
pub fn mobility(board: &Board, color: Color, progress: f64) -> f64 {
    let score: f64 = board
        .pieces_of(color)
        .filter_map(|(square, piece)| {
            mobility_weight(piece, progress)
                .map(|weight| pseudo_legal_moves(board, square).len() as f64 * weight)
        })
        .sum();
    score * MOBILITY_WEIGHT
}

fn is_main_center(square: Square) -> bool {
    (3..=6).contains(&square.row) && (3..=5).contains(&square.col)
}

fn is_secondary_center(square: Square) -> bool {
    let (r, c) = (square.row, square.col);
    ((r == 2 || r == 7) && (3..=5).contains(&c)) || ((3..=6).contains(&r) && (c == 2 || c == 6))
}

/// Pieces standing in the middle of the board. Matters less as the game
/// thins out.
pub fn center_control(board: &Board, color: Color, progress: f64) -> f64 {
    let mut score = 0.0;
    for (square, _) in board.pieces_of(color) {
        if is_main_center(square) {
            score += 20.0;
        } else if is_secondary_center(square) {
            score += 10.0;
        }
    }

    let weight = if progress > 1.5 {
        (1.0 - (progress - 1.5) * 0.8).max(0.2)
    } else {
        1.0
    };
    score * weight
}

/// Counts directions in which the cannon on `square` has a screen with a
/// valuable enemy piece right behind it.
pub fn cannon_mounts(board: &Board, square: Square, color: Color) -> f64 {
    let mut bonus = 0.0;
    for (dr, dc) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
        let mut current = square;
        let mut screened = false;
        while let Some(next) = current.offset(dr, dc) {
            current = next;
            let Some((piece, owner)) = board.get(next) else {
                continue;
            };
            if !screened {
                screened = true;
                continue;
            }
            if owner != color && (piece == Piece::King || piece.is_major()) {
                bonus += CANNON_MOUNT_BONUS;
                if piece == Piece::King {
                    bonus += CANNON_KING_MOUNT_BONUS;
                }
            }
            break;
        }
    }
    bonus
}

/// Development and pawn structure: attackers across the river or on the
/// river bank, undeveloped attackers early on, intact home pawns early on,
/// and side-by-side advanced pawns.
pub fn territory_and_pawn_structure(board: &Board, color: Color, progress: f64) -> f64 {
    let mut score = 0.0;
    let early = progress < 1.0;

    for (square, piece) in board.pieces_of(color) {
        let row = relative_row(square, color);
        if piece.is_major() {
            if square.is_across_river(color) {
                score += ENEMY_TERRITORY_BONUS;
            } else if row == 5 {
                score += RIVER_BANK_BONUS;
            } else if early && row >= 8 {
                score -= UNDEVELOPED_PENALTY;
            }
        }

        if piece == Piece::Pawn {
            if early && row == 6 && square.col % 2 == 0 {
                score += HOME_PAWN_BONUS;
            }
            if square.is_across_river(color) {
                let right = square.offset(0, 1);
                if right.map_or(false, |r| holds(board, r, Piece::Pawn, color)) {
                    score += CONNECTED_PAWN_BONUS;
                }
            }
        }
    }

    score
}

/// Small bonuses for coordinated attacking pieces.
pub fn strategic_formations(board: &Board, color: Color, _progress: f64) -> f64 {
    let mut cannons = vec![];
    let mut horses = 0;
    let mut chariots = 0;
    for (square, piece) in board.pieces_of(color) {
        match piece {
            Piece::Cannon => cannons.push(square),
            Piece::Horse => horses += 1,
            Piece::Chariot => chariots += 1,
            _ => {}
        }
    }

    let mut score = 0.0;
    if cannons.len() == 2 && cannons.iter().all(|sq| sq.is_across_river(color)) {
        score += STRATEGIC_FORMATION_BONUS * 0.8;
    }
    if !cannons.is_empty() && horses > 0 {
        score += STRATEGIC_FORMATION_BONUS * 0.5;
    }
    if chariots > 0 && (!cannons.is_empty() || horses > 0) {
        score += STRATEGIC_FORMATION_BONUS * 0.3;
    }
    score
}

/// Penalty for attacking pieces that hang: attacked by the opponent and
/// not recapturable. Red's point of view.
pub fn piece_safety(board: &Board) -> f64 {
    let mut score = 0.0;
    for (square, piece, color) in board.pieces() {
        if !piece.is_major() {
            continue;
        }
        if is_square_attacked(board, square, color.opposite())
            && !is_square_protected(board, square, color)
        {
            let penalty = opening_value(piece) * PIECE_SAFETY_PENALTY_FACTOR;
            score += match color {
                Color::Red => -penalty,
                Color::Black => penalty,
            };
        }
    }
    score
}
