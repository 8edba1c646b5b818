//! Opening book, studied endgames and kill patterns, consulted by the
//! engine through `KnowledgeOracle`.

#[allow(clippy::module_inception)]
pub mod book;
pub mod knowledge;

pub use book::{Book, BookMove, BookNode, OpeningLine};
pub use knowledge::{EndgameStudy, KillPattern, KnowledgeBase, KnowledgeError, Outcome};

use crate::board::color::Color;
use crate::board::Board;
use crate::xiangqi_move::XiangqiMove;

/// Source of precomputed knowledge. Every suggestion is advisory: the
/// engine validates moves before playing them, so an oracle may return
/// anything. Implementations only override what they know about.
pub trait KnowledgeOracle: Send + Sync {
    /// Book move for the game that produced `kifu` (moves from the
    /// standard starting layout, oldest first).
    fn opening_move(
        &self,
        _board: &Board,
        _mover: Color,
        _kifu: &[XiangqiMove],
    ) -> Option<XiangqiMove> {
        None
    }

    /// First move of a recognized mating pattern.
    fn kill_pattern_move(&self, _board: &Board, _mover: Color) -> Option<XiangqiMove> {
        None
    }

    /// Recommended move of a recognized studied endgame.
    fn endgame_move(&self, _board: &Board, _mover: Color) -> Option<XiangqiMove> {
        None
    }

    /// Expected result of a recognized studied endgame, from `mover`'s
    /// side.
    fn known_endgame_score(&self, _board: &Board, _mover: Color) -> Option<i32> {
        None
    }

    /// Move to expand first in tree search.
    fn priority_move(&self, board: &Board, mover: Color) -> Option<XiangqiMove> {
        self.kill_pattern_move(board, mover)
    }
}
