//! Alpha-beta search algorithm implementation.
//!
//! # Core Algorithm
//!
//! Minimax with alpha-beta pruning relative to a fixed color: nodes where
//! that color is to move maximize, the others minimize. Scores always come
//! from the evaluator's point of view for that color.
//!
//! # Optimizations
//!
//! ## Iterative Deepening
//! Searches at increasing depths (1..max_depth). Killer moves, history
//! weights and transposition table moves gathered at depth N-1 order the
//! moves at depth N. Each iteration runs against a wall-clock deadline; an
//! iteration that runs out of time is discarded and the result of the last
//! completed depth is kept.
//!
//! ## Transposition Table
//! Caches node results by position key and side to move, together with the
//! bound kind and best move.
//!
//! ## Quiescence Search
//! At the leaves, only captures are explored (up to `QUIESCENCE_DEPTH`
//! plies), comparing a stand-pat evaluation against the capture sequences
//! so a leaf is never scored in the middle of an exchange.
//!
//! ## Repetition Handling
//! A position that has occurred three times on the path (including the real
//! game history) scores as a draw. A move the referee forbids as a perpetual
//! check or chase is scored as a near-mate loss for the side making it, so it
//! is only chosen when everything else is worse.
//!
//! ## Parallel Search
//! Root moves can be searched in parallel. Every branch gets its own copy of
//! the search state; the transposition table and history weights are shared,
//! killer moves are thread-local.

use std::cmp::{max, min};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use rayon::prelude::*;
use thiserror::Error;
#[cfg(feature = "instrumentation")]
use tracing::instrument;

use crate::board::color::Color;
use crate::board::error::BoardError;
use crate::board::Board;
use crate::evaluate::{Evaluator, CHECKMATE_SCORE, STALEMATE_SCORE};
use crate::referee::{self, Action, ActionDetails, ActionHistory};
use crate::rules::{check_threefold_repetition, legal_moves};
use crate::xiangqi_move::{MoveList, XiangqiMove};

use super::history_table::HistoryTable;
use super::killer_moves::KillerMovesManager;
use super::move_orderer::MoveOrderer;
use super::transposition_table::{BoundType, Probe, TranspositionTable, DEFAULT_TT_CAPACITY};
use super::{ABSOLUTE_MAX_DEPTH, QUIESCENCE_DEPTH};

/// Scores beyond this are mates; the distance from the root is folded in
/// so shorter mates score higher.
pub const MATE_THRESHOLD: i32 = CHECKMATE_SCORE - 1_000;

/// Score of a move the referee forbids, from the point of view of the side
/// making it.
const FORBIDDEN_MOVE_SCORE: i32 = -(CHECKMATE_SCORE - 500);

#[derive(Error, Debug, PartialEq)]
pub enum SearchError {
    #[error("no available moves")]
    NoAvailableMoves,
    #[error("depth must be at least 1")]
    DepthTooLow,
    #[error("search timed out")]
    Timeout,
    #[error("board error: {0}")]
    Board(#[from] BoardError),
}

/// Search configuration parameters.
struct SearchConfig {
    depth: u8,
    parallel: bool,
    time_limit: Option<Duration>,
}

impl SearchConfig {
    fn new(depth: u8, parallel: bool) -> Self {
        Self {
            depth,
            parallel,
            time_limit: None,
        }
    }
}

/// Statistics collected during search.
struct SearchStats {
    position_count: AtomicUsize,
    quiescence_nodes: AtomicUsize,
    tt_probes: AtomicUsize,
    tt_stores: AtomicUsize,
    forbidden_moves: AtomicUsize,
    depth_reached: u8,
    last_score: Option<i32>,
    last_duration: Option<Duration>,
}

impl SearchStats {
    fn new() -> Self {
        Self {
            position_count: AtomicUsize::new(0),
            quiescence_nodes: AtomicUsize::new(0),
            tt_probes: AtomicUsize::new(0),
            tt_stores: AtomicUsize::new(0),
            forbidden_moves: AtomicUsize::new(0),
            depth_reached: 0,
            last_score: None,
            last_duration: None,
        }
    }

    fn increment(&self) {
        self.position_count.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_quiescence(&self) {
        self.quiescence_nodes.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_tt_probes(&self) {
        self.tt_probes.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_tt_stores(&self) {
        self.tt_stores.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_forbidden(&self) {
        self.forbidden_moves.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&mut self) {
        self.position_count.store(0, Ordering::Relaxed);
        self.quiescence_nodes.store(0, Ordering::Relaxed);
        self.tt_probes.store(0, Ordering::Relaxed);
        self.tt_stores.store(0, Ordering::Relaxed);
        self.forbidden_moves.store(0, Ordering::Relaxed);
        self.depth_reached = 0;
        self.last_score = None;
        self.last_duration = None;
    }

    fn record_result(&mut self, score: i32, depth: u8, duration: Duration) {
        self.last_score = Some(score);
        self.depth_reached = depth;
        self.last_duration = Some(duration);
    }

    fn count(&self) -> usize {
        self.position_count.load(Ordering::Relaxed)
    }
}

/// Everything one search call owns: configuration, statistics and the
/// per-call tables. History weights are shared with later calls through
/// an `Arc`.
pub struct SearchContext {
    config: SearchConfig,
    stats: SearchStats,
    transposition_table: TranspositionTable,
    killer_manager: KillerMovesManager,
    history: Arc<HistoryTable>,
    deadline: Option<Instant>,
    game_ply: u32,
}

impl SearchContext {
    pub fn new(depth: u8) -> Self {
        Self::with_parallel(depth, false)
    }

    pub fn with_parallel(depth: u8, parallel: bool) -> Self {
        Self {
            config: SearchConfig::new(depth, parallel),
            stats: SearchStats::new(),
            transposition_table: TranspositionTable::new(DEFAULT_TT_CAPACITY),
            killer_manager: KillerMovesManager::new(ABSOLUTE_MAX_DEPTH + 1),
            history: Arc::new(HistoryTable::new()),
            deadline: None,
            game_ply: 0,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.config.time_limit = Some(time_limit);
        self
    }

    /// Shares history weights with other contexts.
    pub fn with_history(mut self, history: Arc<HistoryTable>) -> Self {
        self.history = history;
        self
    }

    pub fn with_tt_capacity(mut self, capacity: usize) -> Self {
        self.transposition_table = TranspositionTable::new(capacity);
        self
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.config.parallel = parallel;
    }

    pub fn is_parallel(&self) -> bool {
        self.config.parallel
    }

    pub fn set_time_limit(&mut self, time_limit: Option<Duration>) {
        self.config.time_limit = time_limit;
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.config.time_limit
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.transposition_table.clear();
        self.killer_manager.clear();
    }

    pub fn history(&self) -> &Arc<HistoryTable> {
        &self.history
    }

    pub fn searched_position_count(&self) -> usize {
        self.stats.count()
    }

    pub fn quiescence_nodes(&self) -> usize {
        self.stats.quiescence_nodes.load(Ordering::Relaxed)
    }

    pub fn forbidden_moves(&self) -> usize {
        self.stats.forbidden_moves.load(Ordering::Relaxed)
    }

    pub fn search_depth(&self) -> u8 {
        self.config.depth
    }

    /// Deepest iteration completed by the last search.
    pub fn depth_reached(&self) -> u8 {
        self.stats.depth_reached
    }

    pub fn last_score(&self) -> Option<i32> {
        self.stats.last_score
    }

    pub fn last_search_duration(&self) -> Option<Duration> {
        self.stats.last_duration
    }

    pub fn tt_hits(&self) -> usize {
        self.transposition_table.hits()
    }

    pub fn tt_size(&self) -> usize {
        self.transposition_table.size()
    }

    pub fn tt_probes(&self) -> usize {
        self.stats.tt_probes.load(Ordering::Relaxed)
    }

    pub fn tt_stores(&self) -> usize {
        self.stats.tt_stores.load(Ordering::Relaxed)
    }

    fn check_deadline(&self) -> Result<(), SearchError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SearchError::Timeout),
            _ => Ok(()),
        }
    }

    fn orderer(&self) -> MoveOrderer<'_> {
        MoveOrderer::new(self.game_ply, &self.killer_manager, &self.history)
    }

    fn store(
        &self,
        hash: u64,
        score: i32,
        depth: u8,
        ply: u8,
        bound: BoundType,
        best: Option<XiangqiMove>,
    ) {
        self.stats.increment_tt_stores();
        self.transposition_table
            .store(hash, score, depth, ply, bound, best);
    }
}

/// A position together with the history the referee and the repetition
/// rule need. Searches work on their own copy; the caller's game state is
/// never touched.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub board: Board,
    pub mover: Color,
    pub half_move_count: u32,
    /// (placement key, side to move) of every position reached so far.
    pub positions: Vec<(u64, Color)>,
    pub actions: ActionHistory,
}

impl SearchState {
    pub fn new(board: Board, mover: Color) -> Self {
        let positions = vec![(board.to_key(), mover)];
        Self {
            board,
            mover,
            half_move_count: 0,
            positions,
            actions: ActionHistory::new(),
        }
    }

    pub fn with_history(
        board: Board,
        mover: Color,
        half_move_count: u32,
        positions: Vec<(u64, Color)>,
        actions: ActionHistory,
    ) -> Self {
        Self {
            board,
            mover,
            half_move_count,
            positions,
            actions,
        }
    }
}

/// Plays `mv` with full bookkeeping, runs `f` on the new state, then
/// restores the state exactly.
fn with_move_applied<F, R>(
    state: &mut SearchState,
    mv: &XiangqiMove,
    details: ActionDetails,
    f: F,
) -> Result<R, SearchError>
where
    F: FnOnce(&mut SearchState) -> Result<R, SearchError>,
{
    let mover = state.mover;
    let captured = mv.apply(&mut state.board)?;
    state.mover = mover.opposite();
    state.half_move_count += 1;
    state.positions.push((state.board.to_key(), state.mover));
    state.actions.push_hypothetical(Action::new(mover, *mv, details));

    let result = f(state);

    state.actions.pop_hypothetical();
    state.positions.pop();
    state.half_move_count -= 1;
    state.mover = mover;
    mv.undo(&mut state.board, captured);

    result
}

/// Board-only variant used by quiescence, which never consults the
/// histories.
fn with_capture_applied<F, R>(state: &mut SearchState, mv: &XiangqiMove, f: F) -> Result<R, SearchError>
where
    F: FnOnce(&mut SearchState) -> Result<R, SearchError>,
{
    let mover = state.mover;
    let captured = mv.apply(&mut state.board)?;
    state.mover = mover.opposite();
    state.half_move_count += 1;

    let result = f(state);

    state.half_move_count -= 1;
    state.mover = mover;
    mv.undo(&mut state.board, captured);

    result
}

/// Updates best score and move if new score is better.
/// Returns true if best_score was updated.
fn update_best(
    score: i32,
    candidate_move: &XiangqiMove,
    maximizing_player: bool,
    best_score: &mut i32,
    best_move: &mut Option<XiangqiMove>,
) -> bool {
    let is_better = if maximizing_player {
        score > *best_score
    } else {
        score < *best_score
    };

    if is_better {
        *best_score = score;
        *best_move = Some(*candidate_move);
    }
    is_better
}

fn forbidden_score(maximizing_player: bool) -> i32 {
    if maximizing_player {
        FORBIDDEN_MOVE_SCORE
    } else {
        -FORBIDDEN_MOVE_SCORE
    }
}

/// Mates found closer to the root score further from zero.
fn mate_distance_adjusted(score: i32, ply: u8) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

fn bound_for(score: i32, alpha: i32, beta: i32) -> BoundType {
    if score <= alpha {
        BoundType::Upper
    } else if score >= beta {
        BoundType::Lower
    } else {
        BoundType::Exact
    }
}

fn move_to_front(moves: &mut [(XiangqiMove, ActionDetails)], target: &XiangqiMove) {
    if let Some(pos) = moves.iter().position(|(mv, _)| mv == target) {
        if pos > 0 {
            moves[0..=pos].rotate_right(1);
        }
    }
}

/// Searches for the best move for `state.mover` with iterative deepening.
///
/// # Returns
///
/// - `Ok(best_move)` - The best move of the deepest completed iteration
/// - `Err(SearchError::DepthTooLow)` - If search depth is < 1
/// - `Err(SearchError::NoAvailableMoves)` - If the mover has no legal moves
/// - `Err(SearchError::Timeout)` - If not even depth 1 completed in time
#[must_use = "search returns the best move found"]
#[cfg_attr(feature = "instrumentation", instrument(skip_all))]
pub fn alpha_beta_search(
    context: &mut SearchContext,
    state: &mut SearchState,
    evaluator: &Evaluator,
) -> Result<XiangqiMove, SearchError> {
    let target_depth = context.search_depth();
    debug!("alpha-beta search depth: {}", target_depth);

    if target_depth < 1 {
        return Err(SearchError::DepthTooLow);
    }

    let start = Instant::now();
    context.deadline = context.config.time_limit.map(|limit| start + limit);
    context.game_ply = state.half_move_count;

    let optimize_for = state.mover;
    let mut candidates = legal_moves(&state.board, optimize_for);
    if candidates.is_empty() {
        return Err(SearchError::NoAvailableMoves);
    }
    context.orderer().order_moves(&mut candidates, &state.board, 0);

    let mut root_moves: Vec<(XiangqiMove, ActionDetails)> = candidates
        .iter()
        .map(|mv| (*mv, referee::action_kind_of(&state.board, mv)))
        .collect();

    let mut best: Option<(XiangqiMove, i32)> = None;
    let mut depth_reached = 0;

    for depth in 1..=target_depth {
        if let Some((mv, _)) = best {
            move_to_front(&mut root_moves, &mv);
        }

        let result = if context.is_parallel() {
            search_root_parallel(context, state, evaluator, &root_moves, depth, optimize_for)
        } else {
            search_root_sequential(context, state, evaluator, &root_moves, depth, optimize_for)
        };

        match result {
            Ok((score, Some(mv))) => {
                debug!(
                    "depth {} complete: {} scores {} ({} nodes)",
                    depth,
                    mv,
                    score,
                    context.searched_position_count()
                );
                best = Some((mv, score));
                depth_reached = depth;
                if score >= MATE_THRESHOLD {
                    break;
                }
            }
            Ok((_, None)) => break,
            Err(SearchError::Timeout) => {
                debug!("depth {} abandoned at the deadline", depth);
                break;
            }
            Err(error) => return Err(error),
        }
    }

    let (best_move, best_score) = best.ok_or(SearchError::Timeout)?;
    context
        .stats
        .record_result(best_score, depth_reached, start.elapsed());

    Ok(best_move)
}

#[allow(clippy::too_many_arguments)]
fn search_root_move(
    context: &SearchContext,
    state: &mut SearchState,
    evaluator: &Evaluator,
    mv: &XiangqiMove,
    details: &ActionDetails,
    depth: u8,
    alpha: i32,
    beta: i32,
    optimize_for: Color,
) -> Result<i32, SearchError> {
    if referee::is_forbidden_repetition(state.mover, mv, details, &state.actions) {
        context.stats.increment_forbidden();
        return Ok(forbidden_score(state.mover == optimize_for));
    }
    with_move_applied(state, mv, *details, |state| {
        alpha_beta_minimax(context, state, evaluator, depth - 1, 1, alpha, beta, optimize_for)
    })
}

fn search_root_sequential(
    context: &SearchContext,
    state: &mut SearchState,
    evaluator: &Evaluator,
    root_moves: &[(XiangqiMove, ActionDetails)],
    depth: u8,
    optimize_for: Color,
) -> Result<(i32, Option<XiangqiMove>), SearchError> {
    let mut best_score = i32::MIN;
    let mut best_move = None;
    let mut alpha = -CHECKMATE_SCORE - 1;
    let beta = CHECKMATE_SCORE + 1;

    for (mv, details) in root_moves.iter() {
        let score = search_root_move(
            context,
            state,
            evaluator,
            mv,
            details,
            depth,
            alpha,
            beta,
            optimize_for,
        )?;
        update_best(score, mv, true, &mut best_score, &mut best_move);
        alpha = max(alpha, score);
    }

    Ok((best_score, best_move))
}

fn search_root_parallel(
    context: &SearchContext,
    state: &SearchState,
    evaluator: &Evaluator,
    root_moves: &[(XiangqiMove, ActionDetails)],
    depth: u8,
    optimize_for: Color,
) -> Result<(i32, Option<XiangqiMove>), SearchError> {
    let results: Vec<(i32, XiangqiMove)> = root_moves
        .par_iter()
        .map(|(mv, details)| {
            let mut branch = state.clone();
            search_root_move(
                context,
                &mut branch,
                evaluator,
                mv,
                details,
                depth,
                -CHECKMATE_SCORE - 1,
                CHECKMATE_SCORE + 1,
                optimize_for,
            )
            .map(|score| (score, *mv))
        })
        .collect::<Result<_, _>>()?;

    let mut best_score = i32::MIN;
    let mut best_move = None;
    for (score, mv) in results {
        update_best(score, &mv, true, &mut best_score, &mut best_move);
    }

    Ok((best_score, best_move))
}

/// Core alpha-beta minimax search with pruning.
///
/// # Parameters
///
/// - `depth` - Remaining search depth (decrements each ply)
/// - `ply` - Distance from the root, used for killer moves and mate distance
/// - `alpha` / `beta` - The window of scores that still matter
/// - `optimize_for` - The color whose evaluation is maximized
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "instrumentation", instrument(skip_all))]
fn alpha_beta_minimax(
    context: &SearchContext,
    state: &mut SearchState,
    evaluator: &Evaluator,
    depth: u8,
    ply: u8,
    mut alpha: i32,
    mut beta: i32,
    optimize_for: Color,
) -> Result<i32, SearchError> {
    context.check_deadline()?;
    context.stats.increment();

    if check_threefold_repetition(state.board.to_key(), state.mover, &state.positions) {
        return Ok(STALEMATE_SCORE);
    }

    let hash = state.board.key_with_mover(state.mover);
    context.stats.increment_tt_probes();
    match context.transposition_table.probe(hash, depth, ply, alpha, beta) {
        Probe::Cutoff(score) => return Ok(score),
        Probe::Window(a, b) => {
            alpha = a;
            beta = b;
        }
    }
    let (original_alpha, original_beta) = (alpha, beta);

    let mut moves: MoveList = if depth == 0 {
        MoveList::new()
    } else {
        legal_moves(&state.board, state.mover)
    };

    if moves.is_empty() {
        let score = quiescence_search(
            context,
            state,
            evaluator,
            ply,
            alpha,
            beta,
            optimize_for,
            QUIESCENCE_DEPTH,
        )?;
        context.store(hash, score, depth, ply, bound_for(score, original_alpha, original_beta), None);
        return Ok(score);
    }

    context.orderer().order_moves(&mut moves, &state.board, ply);
    if let Some(tt_move) = context.transposition_table.get_move(hash) {
        if let Some(pos) = moves.iter().position(|mv| *mv == tt_move) {
            if pos > 0 {
                moves[0..=pos].rotate_right(1);
            }
        }
    }

    let maximizing_player = state.mover == optimize_for;
    let mut best_score = if maximizing_player { i32::MIN } else { i32::MAX };
    let mut best_move = None;

    for mv in moves.iter() {
        let details = referee::action_kind_of(&state.board, mv);
        let score = if referee::is_forbidden_repetition(state.mover, mv, &details, &state.actions) {
            context.stats.increment_forbidden();
            forbidden_score(maximizing_player)
        } else {
            with_move_applied(state, mv, details, |state| {
                alpha_beta_minimax(
                    context,
                    state,
                    evaluator,
                    depth - 1,
                    ply + 1,
                    alpha,
                    beta,
                    optimize_for,
                )
            })?
        };

        update_best(score, mv, maximizing_player, &mut best_score, &mut best_move);

        if maximizing_player {
            alpha = max(alpha, score);
        } else {
            beta = min(beta, score);
        }
        if alpha >= beta {
            if !state.board.is_occupied(mv.to) {
                context.killer_manager.store(ply, *mv);
                context.history.record_cutoff(mv.piece, mv.to, depth);
            }
            break;
        }
    }

    context.store(
        hash,
        best_score,
        depth,
        ply,
        bound_for(best_score, original_alpha, original_beta),
        best_move,
    );

    Ok(best_score)
}

/// Capture-only search from a leaf. `qdepth` counts down to zero.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "instrumentation", instrument(skip_all))]
fn quiescence_search(
    context: &SearchContext,
    state: &mut SearchState,
    evaluator: &Evaluator,
    ply: u8,
    mut alpha: i32,
    mut beta: i32,
    optimize_for: Color,
    qdepth: u8,
) -> Result<i32, SearchError> {
    context.check_deadline()?;
    context.stats.increment_quiescence();

    let stand_pat = mate_distance_adjusted(
        evaluator.evaluate(&state.board, optimize_for, state.half_move_count),
        ply,
    );
    let maximizing_player = state.mover == optimize_for;
    if maximizing_player {
        alpha = max(alpha, stand_pat);
    } else {
        beta = min(beta, stand_pat);
    }
    if alpha >= beta || qdepth == 0 || stand_pat.abs() >= MATE_THRESHOLD {
        return Ok(stand_pat);
    }

    let mut captures: MoveList = legal_moves(&state.board, state.mover)
        .into_iter()
        .filter(|mv| state.board.is_occupied(mv.to))
        .collect();
    if captures.is_empty() {
        return Ok(stand_pat);
    }
    context.orderer().order_moves(&mut captures, &state.board, ply);

    for mv in captures.iter() {
        let score = with_capture_applied(state, mv, |state| {
            quiescence_search(
                context,
                state,
                evaluator,
                ply.saturating_add(1),
                alpha,
                beta,
                optimize_for,
                qdepth - 1,
            )
        })?;
        if maximizing_player {
            alpha = max(alpha, score);
        } else {
            beta = min(beta, score);
        }
        if alpha >= beta {
            break;
        }
    }

    Ok(if maximizing_player { alpha } else { beta })
}
