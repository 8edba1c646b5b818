use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::color::Color;
use super::piece::Piece;
use super::square::{Square, SQUARE_COUNT};

// Zobrist board hashing
// * One number for each piece kind of each color at each square ( 7 * 2 * 90 )
// * One number to mark black as the side to move
// Total numbers: 7 * 2 * 90 + 1 = 1261
const PIECE_SQUARE_NUMBERS: usize = 7 * 2 * SQUARE_COUNT;

// Seeded so that keys are stable across runs, which keeps logged keys and
// knowledge-base fixtures comparable.
const ZOBRIST_SEED: u64 = 0x5851_f42d_4c95_7f2d;

pub static ZOBRIST: Lazy<Zobrist> = Lazy::new(Zobrist::new);

pub struct Zobrist {
    numbers: Vec<u64>,
}

impl Zobrist {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let numbers = (0..=PIECE_SQUARE_NUMBERS).map(|_| rng.gen()).collect();
        Self { numbers }
    }

    // nums 0..1260: piece squares
    pub fn piece_square(&self, piece: Piece, color: Color, square: Square) -> u64 {
        let index = (square.index() * 7 + piece.index()) * 2 + color as usize;
        self.numbers[index]
    }

    // num 1260: black to move
    pub fn side_to_move(&self, color: Color) -> u64 {
        match color {
            Color::Red => 0,
            Color::Black => self.numbers[PIECE_SQUARE_NUMBERS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_numbers_are_distinct() {
        let mut seen = FxHashSet::default();
        for index in 0..SQUARE_COUNT {
            let sq = Square::from_index(index);
            for piece in Piece::ALL {
                for color in Color::ALL {
                    assert!(
                        seen.insert(ZOBRIST.piece_square(piece, color, sq)),
                        "duplicate zobrist number for {:?} {:?} at {}",
                        piece,
                        color,
                        sq
                    );
                }
            }
        }
        assert_ne!(ZOBRIST.side_to_move(Color::Black), 0);
    }
}
