//! Heuristic move ordering for improved alpha-beta pruning.
//!
//! Ordering only affects how much of the tree is pruned, never which score
//! the search returns.

use std::cmp::Ordering;

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::Board;
use crate::evaluate::base_value;
use crate::rules::is_king_in_check;
use crate::xiangqi_move::XiangqiMove;

use super::history_table::HistoryTable;
use super::killer_moves::KillerMovesManager;

const PREFERRED_OPENING_MOVES_RED: [&str; 7] =
    ["b7e7", "h7e7", "b9c7", "h9g7", "c6c5", "g6g5", "e6e5"];
const PREFERRED_OPENING_MOVES_BLACK: [&str; 7] =
    ["b2e2", "h2e2", "h0g2", "b0c2", "c3c4", "g3g4", "e3e4"];

const OPENING_PLIES: u32 = 8;
const PREFERRED_MOVE_BONUS: f64 = 500.0;
const EARLY_CANNON_RAID_PENALTY: f64 = 300.0;
const KILLER_BONUS: f64 = 200.0;
const CAPTURE_SCALE: f64 = 100.0;
const CHECK_BONUS: f64 = 150.0;
const DEVELOPMENT_PLIES: u32 = 12;
const DEVELOPMENT_BONUS: f64 = 30.0;
const DEVELOPMENT_THRESHOLD: f64 = 100.0;
const MIDGAME: f64 = 1.0;

/// Scores moves at one node. `game_ply` is the half-move count of the real
/// game at the root, so the opening heuristics fade with the game rather
/// than with search depth.
pub struct MoveOrderer<'a> {
    game_ply: u32,
    killers: &'a KillerMovesManager,
    history: &'a HistoryTable,
}

impl<'a> MoveOrderer<'a> {
    pub(crate) fn new(game_ply: u32, killers: &'a KillerMovesManager, history: &'a HistoryTable) -> Self {
        Self {
            game_ply,
            killers,
            history,
        }
    }

    /// Sorts `moves` best first.
    pub fn order_moves(&self, moves: &mut [XiangqiMove], board: &Board, ply: u8) {
        let mut scratch = board.clone();
        let mut scored: Vec<(f64, XiangqiMove)> = moves
            .iter()
            .map(|mv| (self.score(&mut scratch, mv, ply), *mv))
            .collect();
        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        for (slot, (_, mv)) in moves.iter_mut().zip(scored) {
            *slot = mv;
        }
    }

    pub fn score(&self, board: &mut Board, mv: &XiangqiMove, ply: u8) -> f64 {
        let (piece, color) = mv.piece;
        let victim = board.get(mv.to);
        let mut score = 0.0;

        if self.game_ply < OPENING_PLIES {
            if is_preferred_opening_move(mv, color) {
                score += PREFERRED_MOVE_BONUS;
            }
            // cannon raids across the river this early just lose tempo
            if piece == Piece::Cannon && victim.is_none() {
                let home_row = match color {
                    Color::Red => 7,
                    Color::Black => 2,
                };
                if mv.from.row == home_row && mv.to.is_across_river(color) {
                    score -= EARLY_CANNON_RAID_PENALTY;
                }
            }
        }

        if self.killers.is_killer(ply, mv) {
            score += KILLER_BONUS;
        }

        if let Some((victim_piece, _)) = victim {
            let aggressor = base_value(piece, MIDGAME).max(1.0);
            score += base_value(victim_piece, MIDGAME) / aggressor * CAPTURE_SCALE;
        }

        if gives_check(board, mv) {
            score += CHECK_BONUS;
        }

        score += self.history.score(mv.piece, mv.to) as f64;

        if self.game_ply < DEVELOPMENT_PLIES && score < DEVELOPMENT_THRESHOLD && piece.is_major() {
            let undeveloped = match color {
                Color::Red => mv.from.row >= 7,
                Color::Black => mv.from.row <= 2,
            };
            if undeveloped {
                score += DEVELOPMENT_BONUS;
            }
        }

        score
    }
}

fn is_preferred_opening_move(mv: &XiangqiMove, color: Color) -> bool {
    let preferred = match color {
        Color::Red => &PREFERRED_OPENING_MOVES_RED,
        Color::Black => &PREFERRED_OPENING_MOVES_BLACK,
    };
    let notation = mv.to_notation();
    preferred.iter().any(|m| *m == notation)
}

fn gives_check(board: &mut Board, mv: &XiangqiMove) -> bool {
    let captured = match mv.apply(board) {
        Ok(captured) => captured,
        Err(_) => return false,
    };
    let check = is_king_in_check(board, mv.piece.1.opposite());
    mv.undo(board, captured);
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::legal_moves;
    use crate::xiangqi_position;

    fn notations(moves: &[XiangqiMove]) -> Vec<String> {
        moves.iter().map(|mv| mv.to_notation()).collect()
    }

    #[test]
    fn test_opening_preferences_first() {
        let board = Board::starting_position();
        let killers = KillerMovesManager::new(4);
        let history = HistoryTable::new();
        let orderer = MoveOrderer::new(0, &killers, &history);

        let mut moves = legal_moves(&board, Color::Red);
        orderer.order_moves(&mut moves, &board, 0);
        let first: Vec<String> = notations(&moves[..7]);
        for preferred in PREFERRED_OPENING_MOVES_RED {
            assert!(
                first.contains(&preferred.to_string()),
                "{} should be ordered among the first seven, got {:?}",
                preferred,
                first
            );
        }
    }

    #[test]
    fn test_early_cannon_raid_is_last() {
        let board = Board::starting_position();
        let killers = KillerMovesManager::new(4);
        let history = HistoryTable::new();
        let orderer = MoveOrderer::new(0, &killers, &history);

        let mut moves = legal_moves(&board, Color::Red);
        orderer.order_moves(&mut moves, &board, 0);
        let last = moves.last().unwrap();
        println!("{}", board);
        assert_eq!(last.piece.0, Piece::Cannon);
        assert!(last.to.is_across_river(Color::Red));
        assert!(board.get(last.to).is_none());
    }

    #[test]
    fn test_captures_and_killers() {
        let board = xiangqi_position! {
            ....k....
            .........
            .........
            .........
            r...h....
            .........
            .........
            .........
            .........
            R...K....
        };
        println!("{}", board);
        let killers = KillerMovesManager::new(4);
        let history = HistoryTable::new();
        let orderer = MoveOrderer::new(40, &killers, &history);

        let mut moves = legal_moves(&board, Color::Red);
        orderer.order_moves(&mut moves, &board, 1);
        assert_eq!(moves[0].to_notation(), "a9a4", "chariot takes chariot first");

        let quiet = XiangqiMove::from_notation(&board, "a9b9").unwrap();
        killers.store(1, quiet);
        orderer.order_moves(&mut moves, &board, 1);
        assert_eq!(moves[0].to_notation(), "a9b9", "killer outranks an even trade");
        assert_eq!(moves[1].to_notation(), "a9a4");

        orderer.order_moves(&mut moves, &board, 2);
        assert_eq!(moves[0].to_notation(), "a9a4", "killers are per ply");
    }
}
