use core::fmt;

use smallvec::SmallVec;

use crate::board::error::{BoardError, NotationError};
use crate::board::square::Square;
use crate::board::{Board, PieceId};

/// Moves generated for one side rarely exceed a few dozen, so they stay
/// on the stack.
pub type MoveList = SmallVec<[XiangqiMove; 64]>;

/// A move of `piece` from one square to another. Captures are implied by
/// the destination and resolved when the move is applied.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XiangqiMove {
    pub from: Square,
    pub to: Square,
    pub piece: PieceId,
}

impl XiangqiMove {
    pub fn new(from: Square, to: Square, piece: PieceId) -> Self {
        Self { from, to, piece }
    }

    #[must_use = "move application may fail"]
    pub fn apply(&self, board: &mut Board) -> Result<Option<PieceId>, BoardError> {
        board.apply_move(self.from, self.to)
    }

    pub fn undo(&self, board: &mut Board, captured: Option<PieceId>) {
        board.undo_move(self.from, self.to, self.piece, captured);
    }

    /// Four-character coordinate notation, e.g. `h7e7`.
    pub fn to_notation(&self) -> String {
        format!("{}{}", self.from.to_notation(), self.to.to_notation())
    }

    /// Parses coordinate notation and resolves the moving piece from the
    /// board. Legality is not checked.
    pub fn from_notation(board: &Board, notation: &str) -> Result<Self, NotationError> {
        let (from, to) = parse_squares(notation)?;
        let piece = board.get(from).ok_or_else(|| NotationError::EmptyOrigin {
            notation: notation.to_string(),
        })?;
        Ok(Self::new(from, to, piece))
    }

    /// The same move seen from the other side of the board.
    pub fn mirrored(&self) -> Self {
        let (piece, color) = self.piece;
        Self::new(
            self.from.mirrored(),
            self.to.mirrored(),
            (piece, color.opposite()),
        )
    }
}

/// Splits `a0b1`-style notation into its two squares.
pub fn parse_squares(notation: &str) -> Result<(Square, Square), NotationError> {
    if notation.len() != 4 || !notation.is_ascii() {
        return Err(NotationError::InvalidMove {
            notation: notation.to_string(),
        });
    }
    let invalid = |_| NotationError::InvalidMove {
        notation: notation.to_string(),
    };
    let from = Square::from_notation(&notation[0..2]).map_err(invalid)?;
    let to = Square::from_notation(&notation[2..4]).map_err(invalid)?;
    Ok((from, to))
}

impl fmt::Display for XiangqiMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_notation())
    }
}

impl fmt::Debug for XiangqiMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (piece, color) = self.piece;
        write!(f, "{}({})", self.to_notation(), piece.to_fen_char(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::color::Color;
    use crate::board::piece::Piece;

    #[test]
    fn test_from_notation_resolves_piece() {
        let board = Board::starting_position();
        let mv = XiangqiMove::from_notation(&board, "h7e7").unwrap();
        assert_eq!(mv.from, Square::new(7, 7));
        assert_eq!(mv.to, Square::new(7, 4));
        assert_eq!(mv.piece, (Piece::Cannon, Color::Red));
        assert_eq!(mv.to_string(), "h7e7");
    }

    #[test]
    fn test_from_notation_errors() {
        let board = Board::starting_position();
        assert_eq!(
            XiangqiMove::from_notation(&board, "e5e4"),
            Err(NotationError::EmptyOrigin {
                notation: "e5e4".to_string()
            })
        );
        assert!(XiangqiMove::from_notation(&board, "z7e7").is_err());
        assert!(XiangqiMove::from_notation(&board, "h7e").is_err());
    }

    #[test]
    fn test_mirrored() {
        let board = Board::starting_position();
        let mv = XiangqiMove::from_notation(&board, "h7e7").unwrap();
        let mirrored = mv.mirrored();
        assert_eq!(mirrored.to_notation(), "b2e2");
        assert_eq!(mirrored.piece, (Piece::Cannon, Color::Black));
    }
}
