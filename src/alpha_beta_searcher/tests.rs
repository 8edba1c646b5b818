//! Search tests on small constructed positions.
//!
//! Test coverage:
//! - Material and mate finding for both colors
//! - Error handling (zero depth, no moves, timeout)
//! - Deadlines cut iterative deepening short
//! - Referee-forbidden moves are avoided
//! - Parallel vs sequential search consistency
//! - Depth ceilings per phase and clock

use std::time::Duration;

use super::*;
use crate::board::color::Color;
use crate::board::Board;
use crate::evaluate::{Evaluator, CHECKMATE_SCORE};
use crate::referee::{action_kind_of, Action, ActionHistory};
use crate::xiangqi_move::XiangqiMove;
use crate::xiangqi_position;

/// Red can take an undefended chariot on a4.
fn free_chariot() -> Board {
    xiangqi_position! {
        ...k.....
        .........
        .........
        .........
        r........
        .........
        .........
        .........
        .........
        R...K....
    }
}

/// Red mates with h7d7: the king cannot step to e0 without facing the red
/// king, and d1 stays on the chariot's file.
fn mate_in_one() -> Board {
    xiangqi_position! {
        ...k.....
        .........
        .........
        .........
        .........
        .........
        .........
        .......R.
        .........
        ....K....
    }
}

fn search(board: Board, mover: Color, depth: u8) -> (Result<XiangqiMove, SearchError>, SearchContext) {
    let mut context = SearchContext::new(depth);
    let mut state = SearchState::new(board, mover);
    let result = alpha_beta_search(&mut context, &mut state, &Evaluator::default());
    (result, context)
}

#[test]
fn test_depth_one_takes_free_chariot() {
    let board = free_chariot();
    println!("{}", board);

    let (result, context) = search(board, Color::Red, 1);
    let best = result.unwrap();
    assert_eq!(best.to_notation(), "a9a4", "expected the chariot capture, got {}", best);
    assert_eq!(context.depth_reached(), 1);
    assert!(context.searched_position_count() > 0);
}

/// The horse on a4 is guarded by the black chariot on a0.
fn defended_horse() -> Board {
    xiangqi_position! {
        r..k.....
        .........
        .........
        .........
        h........
        .........
        .........
        .........
        .........
        R...K....
    }
}

#[test]
fn test_depth_one_sees_the_recapture() {
    let board = defended_horse();
    println!("{}", board);

    let (result, context) = search(board, Color::Red, 1);
    let best = result.unwrap();
    assert_ne!(
        best.to_notation(),
        "a9a4",
        "trading the chariot for a defended horse loses material"
    );
    assert_eq!(context.depth_reached(), 1);
}

#[test]
fn test_find_mate_in_1_red() {
    let board = mate_in_one();
    println!("{}", board);

    let (result, context) = search(board, Color::Red, 3);
    let best = result.unwrap();
    assert_eq!(best.to_notation(), "h7d7", "{} does not lead to checkmate", best);
    let score = context.last_score().unwrap();
    assert!(
        score > CHECKMATE_SCORE / 2,
        "mate should dominate any positional score, got {}",
        score
    );
}

#[test]
fn test_find_mate_in_1_black() {
    let board = mate_in_one().mirrored();
    println!("{}", board);

    let (result, context) = search(board, Color::Black, 2);
    let best = result.unwrap();
    assert_eq!(best.to_notation(), "b2f2", "{} does not lead to checkmate", best);
    assert!(context.last_score().unwrap() >= MATE_THRESHOLD);
}

#[test]
fn test_forbidden_perpetual_check_is_avoided() {
    let board = mate_in_one();
    println!("{}", board);

    let mate = XiangqiMove::from_notation(&board, "h7d7").unwrap();
    let details = action_kind_of(&board, &mate);
    let mut actions = ActionHistory::new();
    for _ in 0..3 {
        actions.record(Action::new(Color::Red, mate, details));
    }

    let mut context = SearchContext::new(1);
    let mut state = SearchState::with_history(
        board.clone(),
        Color::Red,
        40,
        vec![(board.to_key(), Color::Red)],
        actions,
    );
    let best = alpha_beta_search(&mut context, &mut state, &Evaluator::default()).unwrap();

    assert_ne!(best, mate, "the fourth identical check is forbidden");
    assert!(context.forbidden_moves() > 0);
    assert!(context.last_score().unwrap() < MATE_THRESHOLD);
}

#[test]
fn test_search_leaves_state_untouched() {
    let board = free_chariot();
    let mut context = SearchContext::new(2);
    let mut state = SearchState::new(board.clone(), Color::Red);
    alpha_beta_search(&mut context, &mut state, &Evaluator::default()).unwrap();

    assert_eq!(state.board, board);
    assert_eq!(state.mover, Color::Red);
    assert_eq!(state.positions.len(), 1);
    assert!(state.actions.is_empty());
    assert_eq!(context.depth_reached(), 2);
}

#[test]
fn test_zero_depth_is_rejected() {
    let (result, _) = search(Board::starting_position(), Color::Red, 0);
    assert_eq!(result, Err(SearchError::DepthTooLow));
}

#[test]
fn test_no_available_moves() {
    let mut board = mate_in_one();
    let mate = XiangqiMove::from_notation(&board, "h7d7").unwrap();
    mate.apply(&mut board).unwrap();
    println!("{}", board);

    let (result, _) = search(board, Color::Black, 2);
    assert_eq!(result, Err(SearchError::NoAvailableMoves));
}

#[test]
fn test_timeout_before_first_depth() {
    let mut context = SearchContext::new(4).with_time_limit(Duration::ZERO);
    let mut state = SearchState::new(Board::starting_position(), Color::Red);
    let result = alpha_beta_search(&mut context, &mut state, &Evaluator::default());
    assert_eq!(result, Err(SearchError::Timeout));
}

#[test]
fn test_deadline_keeps_last_completed_depth() {
    let mut context = SearchContext::new(8).with_time_limit(Duration::from_millis(300));
    let mut state = SearchState::new(Board::starting_position(), Color::Red);
    let result = alpha_beta_search(&mut context, &mut state, &Evaluator::default());

    assert!(result.is_ok(), "a completed shallow depth still yields a move");
    let depth = context.depth_reached();
    assert!(
        depth >= 1 && depth < 8,
        "expected the deadline to stop deepening early, reached depth {}",
        depth
    );
}

#[test]
fn test_parallel_and_sequential_agree() {
    for board in [free_chariot(), mate_in_one()] {
        println!("{}", board);
        let evaluator = Evaluator::default();

        let mut sequential = SearchContext::with_parallel(1, false);
        let mut parallel = SearchContext::with_parallel(1, true);
        let seq_move =
            alpha_beta_search(&mut sequential, &mut SearchState::new(board.clone(), Color::Red), &evaluator)
                .unwrap();
        let par_move =
            alpha_beta_search(&mut parallel, &mut SearchState::new(board.clone(), Color::Red), &evaluator)
                .unwrap();

        assert_eq!(seq_move, par_move);
        assert_eq!(sequential.last_score(), parallel.last_score());
    }
}

#[test]
fn test_history_is_shared_between_contexts() {
    let history = std::sync::Arc::new(HistoryTable::new());
    let mut context = SearchContext::new(3).with_history(history.clone());
    let mut state = SearchState::new(free_chariot(), Color::Red);
    alpha_beta_search(&mut context, &mut state, &Evaluator::default()).unwrap();

    assert!(std::sync::Arc::ptr_eq(context.history(), &history));
}

#[test]
fn test_depth_limit_by_phase_and_clock() {
    assert_eq!(depth_limit(0.0, 0.3), 1);
    assert_eq!(depth_limit(0.0, 3.0), 3);
    assert_eq!(depth_limit(0.5, 10.0), 4);
    assert_eq!(depth_limit(1.2, 5.0), 4);
    assert_eq!(depth_limit(1.2, 10.0), 5);
    assert_eq!(depth_limit(2.2, 7.0), 5);
    assert_eq!(depth_limit(2.2, 30.0), 7);
    assert!(depth_limit(2.5, 1_000.0) <= ABSOLUTE_MAX_DEPTH);
}
