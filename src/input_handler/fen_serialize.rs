//! FEN serialization - converts a board and side to move to a FEN string.

use crate::board::color::Color;
use crate::board::square::{Square, COLS, ROWS};
use crate::board::Board;

use super::fen::FenPosition;

/// Piece placement only, rows 0 through 9.
pub fn placement_to_fen(board: &Board) -> String {
    let mut fen = String::new();

    for row in 0..ROWS {
        let mut empty_count = 0;
        for col in 0..COLS {
            if let Some((piece, color)) = board.get(Square::new(row, col)) {
                if empty_count > 0 {
                    fen.push_str(&empty_count.to_string());
                    empty_count = 0;
                }
                fen.push(piece.to_fen_char(color));
            } else {
                empty_count += 1;
            }
        }
        if empty_count > 0 {
            fen.push_str(&empty_count.to_string());
        }
        if row < ROWS - 1 {
            fen.push('/');
        }
    }

    fen
}

pub fn to_fen(board: &Board, turn: Color, halfmove_clock: u32, fullmove_number: u32) -> String {
    format!(
        "{} {} - - {} {}",
        placement_to_fen(board),
        turn.to_fen(),
        halfmove_clock,
        fullmove_number
    )
}

impl FenPosition {
    pub fn to_fen(&self) -> String {
        to_fen(
            &self.board,
            self.turn,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_handler::fen::{parse_fen, STARTING_POSITION_FEN};

    #[test]
    fn test_starting_position_to_fen() {
        let board = Board::starting_position();
        assert_eq!(to_fen(&board, Color::Red, 0, 1), STARTING_POSITION_FEN);
    }

    #[test]
    fn test_midgame_position_survives_serialization() {
        let fen = "r1bakab1r/9/1cn4cn/p1p1p1p1p/9/9/P1P1P1P1P/1CN1C1N2/9/R1BAKAB1R b - - 4 3";
        let position = parse_fen(fen).unwrap();
        println!("{}", position.board);
        assert_eq!(position.to_fen(), fen);
    }
}
