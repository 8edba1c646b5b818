pub mod color;
pub mod error;
pub mod piece;
pub mod square;
pub mod zobrist;

mod display;

#[cfg(test)]
mod tests;

use color::Color;
use error::BoardError;
use piece::Piece;
use square::{Square, SQUARE_COUNT};
use zobrist::ZOBRIST;

use crate::xiangqi_position;

/// A piece together with its owner.
pub type PieceId = (Piece, Color);

/// Per-kind piece counts for one side, indexed by `Piece::index`.
pub type PieceCounts = [u8; 7];

/// Piece placement on the 10x9 grid plus an incrementally maintained
/// zobrist key. The board does not know whose turn it is; the mover is
/// always passed alongside it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    squares: [Option<PieceId>; SQUARE_COUNT],
    hash: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            squares: [None; SQUARE_COUNT],
            hash: 0,
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn starting_position() -> Self {
        xiangqi_position! {
            rnbakabnr
            .........
            .c.....c.
            p.p.p.p.p
            .........
            .........
            P.P.P.P.P
            .C.....C.
            .........
            RNBAKABNR
        }
    }

    pub fn get(&self, square: Square) -> Option<PieceId> {
        if !square.is_valid() {
            return None;
        }
        self.squares[square.index()]
    }

    /// Out-of-bounds coordinates read as empty.
    pub fn piece_at(&self, row: i8, col: i8) -> Option<PieceId> {
        self.get(Square::new(row, col))
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.get(square).is_some()
    }

    pub fn put(&mut self, square: Square, piece: Piece, color: Color) -> Result<(), BoardError> {
        check_bounds(square)?;
        if self.is_occupied(square) {
            return Err(BoardError::SquareOccupiedBoardPutError { square });
        }
        self.squares[square.index()] = Some((piece, color));
        self.hash ^= ZOBRIST.piece_square(piece, color, square);
        Ok(())
    }

    pub fn remove(&mut self, square: Square) -> Option<PieceId> {
        let (piece, color) = self.get(square)?;
        self.squares[square.index()] = None;
        self.hash ^= ZOBRIST.piece_square(piece, color, square);
        Some((piece, color))
    }

    fn set(&mut self, square: Square, value: Option<PieceId>) {
        self.remove(square);
        if let Some((piece, color)) = value {
            self.squares[square.index()] = Some((piece, color));
            self.hash ^= ZOBRIST.piece_square(piece, color, square);
        }
    }

    /// Moves the piece on `from` to `to`, returning whatever was captured.
    /// Geometry is not checked here; callers validate through `rules`.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Result<Option<PieceId>, BoardError> {
        check_bounds(from)?;
        check_bounds(to)?;
        let moved = self
            .remove(from)
            .ok_or(BoardError::FromSquareIsEmptyMoveApplicationError { square: from })?;
        let captured = self.remove(to);
        self.set(to, Some(moved));
        Ok(captured)
    }

    /// Reverts `apply_move` given the piece that moved and the value it
    /// returned.
    pub fn undo_move(
        &mut self,
        from: Square,
        to: Square,
        moved: PieceId,
        captured: Option<PieceId>,
    ) {
        self.set(from, Some(moved));
        self.set(to, captured);
    }

    /// Placement-only key: equal placements give equal keys regardless of
    /// how they were reached.
    pub fn to_key(&self) -> u64 {
        self.hash
    }

    /// Key that also distinguishes the side to move.
    pub fn key_with_mover(&self, mover: Color) -> u64 {
        self.hash ^ ZOBRIST.side_to_move(mover)
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|(p, c)| (Square::from_index(index), p, c)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces()
            .filter(move |&(_, _, c)| c == color)
            .map(|(sq, p, _)| (sq, p))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces_of(color)
            .find(|&(_, piece)| piece == Piece::King)
            .map(|(sq, _)| sq)
    }

    pub fn piece_count(&self) -> usize {
        self.squares.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn piece_counts(&self, color: Color) -> PieceCounts {
        let mut counts = [0; 7];
        for (_, piece) in self.pieces_of(color) {
            counts[piece.index()] += 1;
        }
        counts
    }

    /// Rejects placements no game could reach by piece count alone.
    pub fn check_piece_count_legality(&self) -> Result<(), BoardError> {
        for color in Color::ALL {
            let counts = self.piece_counts(color);
            for piece in Piece::ALL {
                let count = counts[piece.index()];
                if count > piece.max_count() {
                    return Err(BoardError::TooManyPiecesError {
                        piece,
                        color,
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Rotates the board 180 degrees and swaps colors, so a position with
    /// black to move reads as the same position with red to move.
    pub fn mirrored(&self) -> Self {
        let mut mirrored = Board::new();
        for (square, piece, color) in self.pieces() {
            mirrored.set(square.mirrored(), Some((piece, color.opposite())));
        }
        mirrored
    }
}

fn check_bounds(square: Square) -> Result<(), BoardError> {
    if square.is_valid() {
        Ok(())
    } else {
        Err(BoardError::OutOfBoundsError {
            row: square.row,
            col: square.col,
        })
    }
}
