use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::alpha_beta_searcher::{alpha_beta_search, SearchContext, SearchState};
use crate::board::color::Color;
use crate::board::Board;
use crate::evaluate::Evaluator;
use crate::rules::legal_moves;

#[derive(Debug)]
pub enum CountPositionsStrategy {
    All,
    AlphaBeta,
}

impl FromStr for CountPositionsStrategy {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(CountPositionsStrategy::All),
            "alpha-beta" => Ok(CountPositionsStrategy::AlphaBeta),
            _ => Err("invalid strategy; options are: all, alpha-beta"),
        }
    }
}

/// Number of leaf positions of the legal move tree `depth` plies deep.
pub fn count_positions(board: &mut Board, mover: Color, depth: u8) -> usize {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(board, mover);
    if depth == 1 {
        return moves.len();
    }

    let mut count = 0;
    for mv in moves.iter() {
        let captured = match mv.apply(board) {
            Ok(captured) => captured,
            Err(_) => continue,
        };
        count += count_positions(board, mover.opposite(), depth - 1);
        mv.undo(board, captured);
    }
    count
}

pub fn run_count_positions(depth: u8, strategy: CountPositionsStrategy, board: Board, mover: Color) {
    let mut total_positions = 0;
    let mut total_duration = Duration::from_secs(0);
    let evaluator = Evaluator::default();

    for depth in 1..=depth {
        let mut board = board.clone();

        let started = Instant::now();
        let count = match strategy {
            CountPositionsStrategy::All => count_positions(&mut board, mover, depth),
            CountPositionsStrategy::AlphaBeta => {
                let mut context = SearchContext::new(depth);
                let mut state = SearchState::new(board, mover);
                if let Err(error) = alpha_beta_search(&mut context, &mut state, &evaluator) {
                    println!("search failed at depth {}: {}", depth, error);
                    break;
                }
                context.searched_position_count()
            }
        };
        let duration = started.elapsed();
        let positions_per_second = count as f64 / duration.as_secs_f64();

        total_positions += count;
        total_duration += duration;

        println!(
            "depth: {}, positions: {}, positions per second: {:.0}",
            depth, count, positions_per_second
        );
    }

    println!(
        "total positions: {}, total duration: {:?}, positions per second: {:.0}",
        total_positions,
        total_duration,
        total_positions as f64 / total_duration.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xiangqi_position;

    #[test]
    fn test_count_positions_from_start() {
        let mut board = Board::starting_position();
        assert_eq!(count_positions(&mut board, Color::Red, 1), 44);
        assert_eq!(count_positions(&mut board, Color::Red, 2), 1_920);
        assert_eq!(board, Board::starting_position(), "board is restored");
    }

    #[test]
    fn test_count_positions_lone_kings() {
        let mut board = xiangqi_position! {
            ...k.....
            .........
            .........
            .........
            .........
            .........
            .........
            .........
            .........
            .....K...
        };
        println!("{}", board);
        // e9 and f8; g9 is outside the palace
        assert_eq!(count_positions(&mut board, Color::Red, 0), 1);
        assert_eq!(count_positions(&mut board, Color::Red, 1), 2);
    }

    #[test]
    fn test_strategy_from_str() {
        assert!(matches!(
            "alpha-beta".parse::<CountPositionsStrategy>(),
            Ok(CountPositionsStrategy::AlphaBeta)
        ));
        assert!("perft".parse::<CountPositionsStrategy>().is_err());
    }
}
