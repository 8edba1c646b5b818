use std::str::FromStr;

use crate::board::{color::Color, error::BoardError, piece::Piece, square::Square, Board};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FenParseError {
    #[error("Wrong number of fields")]
    WrongNumberOfFields,
    #[error("Invalid piece character: {invalid_character:?}")]
    InvalidPieceCharacter { invalid_character: char },
    #[error("Wrong number of rows: 10 expected, {row_count:?} given")]
    InvalidRowCount { row_count: usize },
    #[error("Row too long: {invalid_row:?}")]
    InvalidRowLength { invalid_row: String },
    #[error("Error placing piece: {board_error:?}")]
    ErrorPlacingPiece { board_error: BoardError },
    #[error("Row incomplete: {incomplete_row:?}")]
    IncompleteRow { incomplete_row: String },
    #[error("Invalid color: {invalid_color:?}")]
    InvalidColor { invalid_color: String },
    #[error("Invalid halfmove clock: {invalid_clock:?}")]
    InvalidHalfmoveClock { invalid_clock: String },
    #[error("Invalid fullmove number: {invalid_number:?}")]
    InvalidFullmoveNumber { invalid_number: String },
}

type FenResult<T> = Result<T, FenParseError>;

pub const STARTING_POSITION_FEN: &str =
    "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// A parsed FEN record: placement, side to move and the two counters.
#[derive(Clone, Debug, PartialEq)]
pub struct FenPosition {
    pub board: Board,
    pub turn: Color,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenPosition {
    /// Half moves played since the start of the game, derived from the
    /// fullmove number and the side to move.
    pub fn half_move_count(&self) -> u32 {
        let completed = self.fullmove_number.saturating_sub(1) * 2;
        match self.turn {
            Color::Red => completed,
            Color::Black => completed + 1,
        }
    }
}

/// Parses a FEN string. Fields are: piece placement, active color, two
/// unused `-` placeholders, halfmove clock, and fullmove number. Trailing
/// fields may be omitted; they default to red to move and counters 0 and 1.
pub fn parse_fen(fen: &str) -> FenResult<FenPosition> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 6 {
        return Err(FenParseError::WrongNumberOfFields);
    }

    let board = parse_piece_placement(parts[0])?;
    let turn = parts.get(1).map_or(Ok(Color::Red), |c| parse_active_color(c))?;
    let halfmove_clock = match parts.get(4) {
        Some(clock) => parse_halfmove_clock(clock)?,
        None => 0,
    };
    let fullmove_number = match parts.get(5) {
        Some(number) => parse_fullmove_number(number)?,
        None => 1,
    };

    Ok(FenPosition {
        board,
        turn,
        halfmove_clock,
        fullmove_number,
    })
}

/// Parses the piece placement section of the FEN string
pub fn parse_piece_placement(position: &str) -> FenResult<Board> {
    let rows: Vec<&str> = position.split('/').collect();
    if rows.len() != 10 {
        return Err(FenParseError::InvalidRowCount {
            row_count: rows.len(),
        });
    }

    let mut board = Board::new();
    for (row_idx, row) in rows.iter().enumerate() {
        parse_row(&mut board, row, row_idx as i8)?;
    }
    Ok(board)
}

fn parse_row(board: &mut Board, row: &str, row_number: i8) -> FenResult<()> {
    let mut col = 0i8;

    for c in row.chars() {
        if col >= 9 {
            return Err(FenParseError::InvalidRowLength {
                invalid_row: row.to_string(),
            });
        }

        if let Some(empty_squares) = c.to_digit(10) {
            col += empty_squares as i8;
        } else {
            let (piece, color) = Piece::from_fen_char(c).ok_or(
                FenParseError::InvalidPieceCharacter {
                    invalid_character: c,
                },
            )?;
            board
                .put(Square::new(row_number, col), piece, color)
                .map_err(|e| FenParseError::ErrorPlacingPiece { board_error: e })?;
            col += 1;
        }
    }

    if col > 9 {
        return Err(FenParseError::InvalidRowLength {
            invalid_row: row.to_string(),
        });
    }
    if col != 9 {
        return Err(FenParseError::IncompleteRow {
            incomplete_row: row.to_string(),
        });
    }

    Ok(())
}

fn parse_active_color(active_color: &str) -> FenResult<Color> {
    match active_color {
        "w" | "r" => Ok(Color::Red),
        "b" => Ok(Color::Black),
        _ => Err(FenParseError::InvalidColor {
            invalid_color: active_color.to_string(),
        }),
    }
}

fn parse_halfmove_clock(halfmove_clock: &str) -> FenResult<u32> {
    halfmove_clock
        .parse::<u32>()
        .map_err(|_| FenParseError::InvalidHalfmoveClock {
            invalid_clock: halfmove_clock.to_string(),
        })
}

fn parse_fullmove_number(fullmove_number: &str) -> FenResult<u32> {
    fullmove_number
        .parse::<u32>()
        .map_err(|_| FenParseError::InvalidFullmoveNumber {
            invalid_number: fullmove_number.to_string(),
        })
}

impl FromStr for FenPosition {
    type Err = FenParseError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        parse_fen(fen)
    }
}

// used for parsing cli args: accepts a full FEN and keeps only the placement
impl FromStr for Board {
    type Err = FenParseError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        parse_fen(fen).map(|position| position.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_starting_position() {
        let position = parse_fen(STARTING_POSITION_FEN).unwrap();
        assert_eq!(position.board, Board::starting_position());
        assert_eq!(position.turn, Color::Red);
        assert_eq!(position.half_move_count(), 0);
    }

    #[test]
    fn test_parse_alternate_letters() {
        let fen = "rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR b - - 3 7";
        let position = parse_fen(fen).unwrap();
        assert_eq!(position.board, Board::starting_position());
        assert_eq!(position.turn, Color::Black);
        assert_eq!(position.halfmove_clock, 3);
        assert_eq!(position.half_move_count(), 13);
    }

    #[test]
    fn test_placement_only() {
        let board: Board = "4k4/9/9/9/9/9/9/9/9/4K4".parse().unwrap();
        assert_eq!(board.piece_count(), 2);
        assert_eq!(board.find_king(Color::Red), Some(Square::new(9, 4)));
    }

    #[test]
    fn test_invalid_fen() {
        assert_eq!(
            parse_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/RNBAKABNR w - - 0 1"),
            Err(FenParseError::InvalidRowCount { row_count: 9 })
        );
        assert_eq!(
            parse_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABN w - - 0 1"),
            Err(FenParseError::IncompleteRow {
                incomplete_row: "RNBAKABN".to_string()
            })
        );
        assert_eq!(
            parse_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR x - - 0 1"),
            Err(FenParseError::InvalidColor {
                invalid_color: "x".to_string()
            })
        );
        assert_eq!(
            parse_fen("rnbakabnq/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1"),
            Err(FenParseError::InvalidPieceCharacter {
                invalid_character: 'q'
            })
        );
        assert!(parse_fen("rnbakabnr5/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR").is_err());
    }
}
