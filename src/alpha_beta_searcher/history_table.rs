//! History heuristic for move ordering.
//!
//! Tracks which quiet moves cause cutoffs, indexed by the moving piece and
//! its destination. The table outlives a single search call; `age` halves
//! every entry so old results fade instead of growing without bound.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::board::square::{Square, SQUARE_COUNT};
use crate::board::PieceId;

const PIECE_KINDS: usize = 14;
const HISTORY_SIZE: usize = PIECE_KINDS * SQUARE_COUNT;

/// Uses atomics so root-parallel search threads can share one table.
pub struct HistoryTable {
    table: Vec<AtomicU32>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            table: (0..HISTORY_SIZE).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    #[inline]
    fn index((piece, color): PieceId, to: Square) -> usize {
        (piece.index() * 2 + color as usize) * SQUARE_COUNT + to.index()
    }

    /// Records that moving `piece` to `to` caused a cutoff at `depth`.
    pub fn record_cutoff(&self, piece: PieceId, to: Square, depth: u8) {
        let bonus = (depth as u32) * (depth as u32);
        self.table[Self::index(piece, to)].fetch_add(bonus, Ordering::Relaxed);
    }

    #[inline]
    pub fn score(&self, piece: PieceId, to: Square) -> u32 {
        self.table[Self::index(piece, to)].load(Ordering::Relaxed)
    }

    pub fn age(&self) {
        for entry in self.table.iter() {
            let current = entry.load(Ordering::Relaxed);
            entry.store(current / 2, Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        for entry in self.table.iter() {
            entry.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::color::Color;
    use crate::board::piece::Piece;

    const RED_CANNON: PieceId = (Piece::Cannon, Color::Red);
    const BLACK_CANNON: PieceId = (Piece::Cannon, Color::Black);

    #[test]
    fn test_history_recording() {
        let history = HistoryTable::new();
        let to = Square::new(7, 4);

        assert_eq!(history.score(RED_CANNON, to), 0);
        history.record_cutoff(RED_CANNON, to, 3);
        assert_eq!(history.score(RED_CANNON, to), 9);
        history.record_cutoff(RED_CANNON, to, 4);
        assert_eq!(history.score(RED_CANNON, to), 25);
        assert_eq!(
            history.score(BLACK_CANNON, to),
            0,
            "colors are tracked separately"
        );
    }

    #[test]
    fn test_history_aging_and_clear() {
        let history = HistoryTable::new();
        let to = Square::new(2, 4);

        history.record_cutoff(BLACK_CANNON, to, 5);
        history.age();
        assert_eq!(history.score(BLACK_CANNON, to), 12);

        history.clear();
        assert_eq!(history.score(BLACK_CANNON, to), 0);
    }

    #[test]
    fn test_every_index_in_range() {
        let history = HistoryTable::new();
        for piece in Piece::ALL {
            for color in Color::ALL {
                history.record_cutoff((piece, color), Square::new(9, 8), 1);
                history.record_cutoff((piece, color), Square::new(0, 0), 1);
            }
        }
        assert_eq!(history.score((Piece::Pawn, Color::Black), Square::new(9, 8)), 1);
    }
}
