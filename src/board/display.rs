use super::square::{Square, COLS, ROWS};
use super::Board;
use std::fmt;

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..ROWS {
            write!(f, "{} ", row)?;
            for col in 0..COLS {
                let c = match self.get(Square::new(row, col)) {
                    Some((piece, color)) => piece.to_fen_char(color),
                    None if row == 4 || row == 5 => '~',
                    None => '.',
                };
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h i")
    }
}

/// Builds a board from a 10x9 grid of FEN piece letters, row 0 first.
/// `.` marks an empty square.
#[macro_export]
macro_rules! xiangqi_position {
    ($($piece:tt)*) => {{
        let mut board = $crate::board::Board::new();
        // Convert all input tokens to a string and filter out whitespace characters.
        let pieces: Vec<_> = stringify!($($piece)*)
            .chars()
            .filter(|&c| !c.is_whitespace())
            .collect();
        assert_eq!(pieces.len(), 90, "Invalid number of squares. Expected 90, got {}", pieces.len());
        for (i, &c) in pieces.iter().enumerate() {
            if c != '.' {
                let (piece, color) = $crate::board::piece::Piece::from_fen_char(c)
                    .expect("Invalid character in xiangqi position");
                let square = $crate::board::square::Square::from_index(i);
                board.put(square, piece, color).expect("square should be empty");
            }
        }
        board
    }};
}
