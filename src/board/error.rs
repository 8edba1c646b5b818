use thiserror::Error;

use super::color::Color;
use super::piece::Piece;
use super::square::Square;

#[derive(Error, Debug, PartialEq)]
pub enum BoardError {
    #[error("Cannot put a piece on a square that is already occupied: {square}")]
    SquareOccupiedBoardPutError { square: Square },
    #[error("Square is off the board: ({row}, {col})")]
    OutOfBoundsError { row: i8, col: i8 },
    #[error("Cannot apply move, the `from` square is empty: {square}")]
    FromSquareIsEmptyMoveApplicationError { square: Square },
    #[error("Too many {piece:?} pieces for {color}: {count}")]
    TooManyPiecesError {
        piece: Piece,
        color: Color,
        count: u8,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum NotationError {
    #[error("Invalid square notation: {notation:?}")]
    InvalidSquare { notation: String },
    #[error("Invalid move notation: {notation:?}")]
    InvalidMove { notation: String },
    #[error("No piece on the origin square of move {notation:?}")]
    EmptyOrigin { notation: String },
}
