//! Piece values and piece-square tables, all written from red's side of
//! the board (row 0 is the enemy back rank). Black reads them mirrored.

use crate::board::piece::Piece;

// Base values indexed by `Piece::index`. The king carries no material.
pub const OPENING_VALUES: [f64; 7] = [0.0, 200.0, 200.0, 400.0, 900.0, 500.0, 100.0];
pub const MIDGAME_VALUES: [f64; 7] = [0.0, 250.0, 250.0, 450.0, 900.0, 500.0, 150.0];
pub const ENDGAME_VALUES: [f64; 7] = [0.0, 250.0, 250.0, 500.0, 1000.0, 450.0, 200.0];

// Pawn value multipliers by how far the pawn has advanced past the river.
pub const PAWN_CROSSED_SHALLOW: f64 = 1.5;
pub const PAWN_CROSSED_MIDDLE: f64 = 2.0;
pub const PAWN_CROSSED_DEEP: f64 = 2.8;
pub const PAWN_LAST_RANK: f64 = 4.0;

type Table = [[i32; 9]; 10];

const CHARIOT_TABLE: Table = [
    [10, 10, 12, 20, 20, 20, 12, 10, 10],
    [8, 12, 15, 25, 25, 25, 15, 12, 8],
    [5, 8, 10, 20, 20, 20, 10, 8, 5],
    [0, 5, 8, 15, 15, 15, 8, 5, 0],
    [-2, 0, 5, 10, 10, 10, 5, 0, -2],
    [-5, -2, 0, 5, 5, 5, 0, -2, -5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, -2, -2, -2, 0, 0, 0],
    [-2, 0, 0, 0, 0, 0, 0, 0, -2],
];

const CANNON_TABLE: Table = [
    [0, 0, -5, -5, -10, -5, -5, 0, 0],
    [0, 2, 0, 5, 8, 5, 0, 2, 0],
    [0, 0, 5, 10, 15, 10, 5, 0, 0],
    [5, 5, 10, 20, 25, 20, 10, 5, 5],
    [10, 10, 15, 25, 30, 25, 15, 10, 10],
    [5, 8, 12, 20, 25, 20, 12, 8, 5],
    [0, 0, 0, 10, 15, 10, 0, 0, 0],
    [0, 0, 0, 5, 5, 5, 0, 0, 0],
    [-5, -5, 0, 0, 0, 0, 0, -5, -5],
    [-10, -10, -5, -5, -5, -5, -5, -10, -10],
];

const HORSE_TABLE: Table = [
    [-10, -5, 5, 15, 10, 15, 5, -5, -10],
    [-5, 5, 10, 20, 25, 20, 10, 5, -5],
    [5, 10, 20, 25, 30, 25, 20, 10, 5],
    [0, 8, 15, 20, 25, 20, 15, 8, 0],
    [-5, 5, 10, 15, 20, 15, 10, 5, -5],
    [-8, 0, 5, 10, 15, 10, 5, 0, -8],
    [-10, -5, 0, 5, 10, 5, 0, -5, -10],
    [-15, -8, -2, 0, 5, 0, -2, -8, -15],
    [-20, -15, -10, -5, -5, -5, -10, -15, -20],
    [-25, -20, -15, -10, -10, -10, -15, -20, -25],
];

const ADVISOR_TABLE: Table = [
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0, 0, 0, 5, 0, 5, 0, 0, 0],
    [0, 0, 0, 0, 15, 0, 0, 0, 0],
    [0, 0, 0, 8, 0, 8, 0, 0, 0],
];

const ELEPHANT_TABLE: Table = [
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0, 0, 5, 0, 10, 0, 5, 0, 0],
    [0; 9],
    [5, 0, 10, 0, 15, 0, 10, 0, 5],
    [0; 9],
];

const PAWN_TABLE: Table = [
    [90, 100, 110, 120, 120, 120, 110, 100, 90],
    [85, 95, 100, 110, 115, 110, 100, 95, 85],
    [70, 80, 85, 90, 95, 90, 85, 80, 70],
    [50, 60, 65, 70, 75, 70, 65, 60, 50],
    [30, 35, 40, 45, 50, 45, 40, 35, 30],
    [10, 15, 18, 20, 25, 20, 18, 15, 10],
    [0, 5, 8, 10, 12, 10, 8, 5, 0],
    [0; 9],
    [0; 9],
    [0; 9],
];

// the king strongly prefers not to wander toward the enemy palace
const KING_TABLE: Table = [
    [0, 0, 0, -1000, -5000, -1000, 0, 0, 0],
    [0, 0, 0, -1000, -5000, -1000, 0, 0, 0],
    [0, 0, 0, -1000, -5000, -1000, 0, 0, 0],
    [0; 9],
    [0; 9],
    [0; 9],
    [0; 9],
    [0, 0, 0, 5, 10, 5, 0, 0, 0],
    [0, 0, 0, 0, 15, 0, 0, 0, 0],
    [0, 0, 0, -5, 5, -5, 0, 0, 0],
];

/// Table bonus for `piece` standing on (row, col) as seen from its own side.
/// Callers pass the row already flipped for black.
pub fn table_bonus(piece: Piece, row: usize, col: usize) -> i32 {
    let table = match piece {
        Piece::King => &KING_TABLE,
        Piece::Advisor => &ADVISOR_TABLE,
        Piece::Elephant => &ELEPHANT_TABLE,
        Piece::Horse => &HORSE_TABLE,
        Piece::Chariot => &CHARIOT_TABLE,
        Piece::Cannon => &CANNON_TABLE,
        Piece::Pawn => &PAWN_TABLE,
    };
    table[row][col]
}
