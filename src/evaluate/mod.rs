use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

#[cfg(feature = "instrumentation")]
use tracing::instrument;

use crate::board::color::Color;
use crate::board::piece::Piece;
use crate::board::square::Square;
use crate::board::Board;
use crate::book::KnowledgeOracle;
use crate::rules;

mod tables;
mod terms;

pub use terms::{
    cannon_mounts, center_control, king_safety, mobility, piece_safety, strategic_formations,
    territory_and_pawn_structure,
};

// Larger than any sum of positional terms, so the search always prefers a
// forced mate over material.
pub const CHECKMATE_SCORE: i32 = 100_000;
pub const STALEMATE_SCORE: i32 = 0;

const CHECK_BONUS: f64 = 150.0;
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnding {
    Checkmate { winner: Color },
    Stalemate,
    Repetition,
}

/// Continuous phase indicator: 0 is the opening, 1 the early middlegame,
/// 2 and above a deep endgame. Never decreases as pieces come off.
pub fn game_progress(board: &Board, half_move_count: u32) -> f64 {
    let mut majors = 0;
    let mut total = 0;
    for (_, piece, _) in board.pieces() {
        total += 1;
        if piece.is_major() {
            majors += 1;
        }
    }
    let total = total as f64;
    let moves = half_move_count as f64;

    let score = if majors <= 4 || total <= 12.0 {
        (2.2 + ((12.0 - total) / 10.0) * 0.3).max(2.2)
    } else if majors <= 7 || total <= 16.0 {
        // The floors keep a lost major from pulling the phase back below
        // the move-driven middlegame band, which tops out at 1.8.
        (1.8 + ((16.0 - total) / 10.0) * 0.4).max(1.8)
    } else if moves < 15.0 && majors >= 10 {
        moves / 30.0
    } else if moves < 30.0 && majors >= 8 {
        0.5 + (moves - 15.0) / 30.0
    } else {
        1.0 + (moves / 100.0).min(0.5) + ((28.0 - total) / 20.0).min(0.3)
    };

    score.min(2.5)
}

/// Phase-interpolated material value.
pub fn base_value(piece: Piece, progress: f64) -> f64 {
    let i = piece.index();
    let (opening, midgame, endgame) = (
        tables::OPENING_VALUES[i],
        tables::MIDGAME_VALUES[i],
        tables::ENDGAME_VALUES[i],
    );
    if progress < 1.0 {
        opening + progress * (midgame - opening)
    } else if progress < 2.0 {
        midgame + (progress - 1.0) * (endgame - midgame)
    } else {
        endgame
    }
}

pub fn opening_value(piece: Piece) -> f64 {
    tables::OPENING_VALUES[piece.index()]
}

/// Row as seen from `color`'s side: 0 is the enemy back rank, 9 its own.
pub(crate) fn relative_row(square: Square, color: Color) -> usize {
    match color {
        Color::Red => square.row as usize,
        Color::Black => 9 - square.row as usize,
    }
}

fn pawn_multiplier(square: Square, color: Color) -> f64 {
    let row = relative_row(square, color);
    match row {
        0 => tables::PAWN_LAST_RANK,
        1 => tables::PAWN_CROSSED_DEEP,
        2 | 3 => tables::PAWN_CROSSED_MIDDLE,
        4 => tables::PAWN_CROSSED_SHALLOW,
        _ => 1.0,
    }
}

/// Value of `piece` of `color` on `square`, positive for the owner.
pub fn piece_value_at(board: &Board, piece: Piece, square: Square, progress: f64, color: Color) -> f64 {
    let mut value = base_value(piece, progress);
    if piece == Piece::Pawn {
        value *= pawn_multiplier(square, color);
    }
    value += tables::table_bonus(piece, relative_row(square, color), square.col as usize) as f64;
    if piece == Piece::Cannon {
        value += cannon_mounts(board, square, color);
    }
    value
}

/// Terminal positions scored from `mover`'s point of view.
pub fn terminal_score(board: &Board, mover: Color) -> Option<i32> {
    let opponent = mover.opposite();
    if rules::is_checkmate(board, mover).0 {
        return Some(-CHECKMATE_SCORE);
    }
    if rules::is_checkmate(board, opponent).0 {
        return Some(CHECKMATE_SCORE);
    }
    if rules::is_stalemate(board, mover) || rules::is_stalemate(board, opponent) {
        return Some(STALEMATE_SCORE);
    }
    None
}

/// Sum of all non-terminal terms from red's point of view.
pub fn positional_score(board: &Board, progress: f64) -> f64 {
    let mut score = 0.0;

    for (square, piece, color) in board.pieces() {
        let value = piece_value_at(board, piece, square, progress, color);
        score += match color {
            Color::Red => value,
            Color::Black => -value,
        };
    }

    let diff = |term: &dyn Fn(Color) -> f64| term(Color::Red) - term(Color::Black);
    score += diff(&|c| king_safety(board, c, progress));
    score += diff(&|c| mobility(board, c, progress));
    score += diff(&|c| center_control(board, c, progress));
    score += diff(&|c| territory_and_pawn_structure(board, c, progress));
    score += diff(&|c| strategic_formations(board, c, progress));
    score += piece_safety(board);

    if rules::is_king_in_check(board, Color::Red) {
        score -= CHECK_BONUS;
    }
    if rules::is_king_in_check(board, Color::Black) {
        score += CHECK_BONUS;
    }

    score
}

/// Full evaluation without the knowledge oracle or cache, from `mover`'s
/// point of view.
pub fn static_evaluation(board: &Board, mover: Color, half_move_count: u32) -> i32 {
    if let Some(score) = terminal_score(board, mover) {
        return score;
    }
    non_terminal_score(board, mover, half_move_count)
}

fn non_terminal_score(board: &Board, mover: Color, half_move_count: u32) -> i32 {
    let red_score = positional_score(board, game_progress(board, half_move_count)).round() as i32;
    match mover {
        Color::Red => red_score,
        Color::Black => -red_score,
    }
}

type CacheKey = (u64, Color, u32);

/// Scores positions for the search. Wraps the static evaluation with a
/// studied-endgame override and an LRU cache.
pub struct Evaluator {
    oracle: Option<Arc<dyn KnowledgeOracle>>,
    cache: Mutex<LruCache<CacheKey, i32>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl Evaluator {
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            oracle: None,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn KnowledgeOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn oracle(&self) -> Option<&Arc<dyn KnowledgeOracle>> {
        self.oracle.as_ref()
    }

    /// Score of `board` for `mover`; positive is good for `mover`.
    #[cfg_attr(feature = "instrumentation", instrument(skip_all))]
    pub fn evaluate(&self, board: &Board, mover: Color, half_move_count: u32) -> i32 {
        let key = (board.to_key(), mover, half_move_count);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(&score) = cache.get(&key) {
                return score;
            }
        }

        let score = self.evaluate_uncached(board, mover, half_move_count);

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, score);
        }
        score
    }

    fn evaluate_uncached(&self, board: &Board, mover: Color, half_move_count: u32) -> i32 {
        if let Some(score) = terminal_score(board, mover) {
            return score;
        }
        if let Some(score) = self
            .oracle
            .as_ref()
            .and_then(|oracle| oracle.known_endgame_score(board, mover))
        {
            return score;
        }
        non_terminal_score(board, mover, half_move_count)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
