use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::alpha_beta_searcher::{
    alpha_beta_search, depth_limit, HistoryTable, SearchContext, SearchError, SearchState,
    DEFAULT_TT_CAPACITY,
};
use crate::board::color::Color;
use crate::board::error::{BoardError, NotationError};
use crate::board::Board;
use crate::book::{KnowledgeBase, KnowledgeOracle};
use crate::evaluate::{game_progress, Evaluator, GameEnding, DEFAULT_CACHE_CAPACITY};
use crate::input_handler::fen::FenPosition;
use crate::input_handler::MoveInput;
use crate::mcts::{
    MctsConfig, MonteCarloTreeSearch, DEFAULT_EXPLORATION, DEFAULT_MAX_SIMULATIONS, ROLLOUT_DEPTH,
};
use crate::referee::{action_kind_of, is_forbidden_repetition, Action, ActionHistory};
use crate::rules::{check_threefold_repetition, is_checkmate, is_stalemate, legal_moves};
use crate::xiangqi_move::XiangqiMove;

/// The opening book is only consulted this early in the game.
const BOOK_HALF_MOVES: u32 = 12;
const ENDGAME_PROGRESS: f64 = 2.0;
const ENDGAME_MIN_HALF_MOVES: u32 = 10;
/// MCTS needs at least this much time to beat a shallow alpha-beta search.
const MCTS_MIN_BUDGET_SECS: f64 = 2.5;
const MCTS_BUDGET_SHARE: f64 = 0.6;
const MCTS_EARLY_BUDGET_SHARE: f64 = 0.8;
const MCTS_EARLY_HALF_MOVES: u32 = 4;
const SEARCH_OVERHEAD_SECS: f64 = 0.1;
const MIN_ALPHA_BETA_SECS: f64 = 0.05;

/// Core engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub time_budget: Duration,
    /// Fixed alpha-beta depth. Disables MCTS and the search deadline, so
    /// results are reproducible.
    pub search_depth: Option<u8>,
    pub use_mcts: bool,
    pub mcts_simulations: usize,
    pub mcts_exploration: f64,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub tt_capacity: usize,
    pub eval_cache_capacity: usize,
    pub knowledge_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(5),
            search_depth: None,
            use_mcts: true,
            mcts_simulations: DEFAULT_MAX_SIMULATIONS,
            mcts_exploration: DEFAULT_EXPLORATION,
            seed: None,
            parallel: false,
            tt_capacity: DEFAULT_TT_CAPACITY,
            eval_cache_capacity: DEFAULT_CACHE_CAPACITY,
            knowledge_dir: None,
        }
    }
}

/// Everything a search needs to know about the game so far.
pub struct SearchRequest<'a> {
    pub board: &'a Board,
    pub mover: Color,
    pub half_move_count: u32,
    pub positions: &'a [(u64, Color)],
    pub actions: &'a ActionHistory,
    /// Moves played from the starting layout, oldest first.
    pub kifu: &'a [XiangqiMove],
    pub time_budget: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveSource {
    OpeningBook,
    KillPattern,
    Endgame,
    MonteCarlo,
    AlphaBeta,
    RandomFallback,
}

impl fmt::Display for MoveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveSource::OpeningBook => "opening book",
            MoveSource::KillPattern => "kill pattern",
            MoveSource::Endgame => "endgame study",
            MoveSource::MonteCarlo => "monte carlo tree search",
            MoveSource::AlphaBeta => "alpha-beta search",
            MoveSource::RandomFallback => "random fallback",
        };
        write!(f, "{}", name)
    }
}

/// Result of `find_best_move`. `best_move` is `None` only when the mover
/// has no legal move at all.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    pub best_move: Option<XiangqiMove>,
    pub source: Option<MoveSource>,
    /// Alpha-beta score from the mover's side.
    pub score: Option<i32>,
    pub depth_reached: u8,
    pub nodes: usize,
    pub simulations: usize,
    /// Set when the move was picked at random after every search failed.
    pub fallback: bool,
    pub elapsed: Duration,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            best_move: None,
            source: None,
            score: None,
            depth_reached: 0,
            nodes: 0,
            simulations: 0,
            fallback: false,
            elapsed: Duration::ZERO,
        }
    }

    fn from_source(mv: XiangqiMove, source: MoveSource) -> Self {
        Self {
            best_move: Some(mv),
            source: Some(source),
            ..Self::empty()
        }
    }
}

/// Game state and runtime info
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    turn: Color,
    half_move_count: u32,
    positions: Vec<(u64, Color)>,
    actions: ActionHistory,
    move_history: Vec<XiangqiMove>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Board::starting_position(), Color::Red, 0)
    }
}

impl GameState {
    pub fn new(board: Board, turn: Color, half_move_count: u32) -> Self {
        let positions = vec![(board.to_key(), turn)];
        Self {
            board,
            turn,
            half_move_count,
            positions,
            actions: ActionHistory::new(),
            move_history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn half_move_count(&self) -> u32 {
        self.half_move_count
    }

    pub fn positions(&self) -> &[(u64, Color)] {
        &self.positions
    }

    pub fn actions(&self) -> &ActionHistory {
        &self.actions
    }

    pub fn move_history(&self) -> &[XiangqiMove] {
        &self.move_history
    }

    fn request(&self, time_budget: Duration) -> SearchRequest<'_> {
        SearchRequest {
            board: &self.board,
            mover: self.turn,
            half_move_count: self.half_move_count,
            positions: &self.positions,
            actions: &self.actions,
            kifu: &self.move_history,
            time_budget,
        }
    }
}

impl From<FenPosition> for GameState {
    fn from(position: FenPosition) -> Self {
        let half_move_count = position.half_move_count();
        Self::new(position.board, position.turn, half_move_count)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("Invalid move: {notation}")]
    InvalidMove { notation: String },
    #[error("Move {notation} repeats a perpetual check or chase and is forbidden")]
    ForbiddenRepetition { notation: String },
    #[error("Invalid notation: {error}")]
    Notation {
        #[from]
        error: NotationError,
    },
    #[error("Board error: {error:?}")]
    BoardError {
        #[from]
        error: BoardError,
    },
    #[error("Search error: {error:?}")]
    SearchError {
        #[from]
        error: SearchError,
    },
    #[error("The game is over: {ending:?}")]
    GameOver { ending: GameEnding },
}

/// Plays one game of xiangqi and picks moves for either side.
pub struct Engine {
    config: EngineConfig,
    state: GameState,
    knowledge: Arc<KnowledgeBase>,
    evaluator: Evaluator,
    history: Arc<HistoryTable>,
    last_outcome: Option<SearchOutcome>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine at the standard starting position.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_state(config, GameState::default())
    }

    pub fn with_position(config: EngineConfig, position: FenPosition) -> Self {
        Self::with_state(config, GameState::from(position))
    }

    pub fn with_state(config: EngineConfig, state: GameState) -> Self {
        let knowledge = match &config.knowledge_dir {
            Some(dir) => KnowledgeBase::load(dir).unwrap_or_else(|error| {
                warn!("failed to load knowledge from {:?}: {}", dir, error);
                KnowledgeBase::new()
            }),
            None => KnowledgeBase::new(),
        };
        let knowledge = match config.seed {
            Some(seed) => knowledge.with_seed(seed),
            None => knowledge,
        };
        let knowledge = Arc::new(knowledge);
        let evaluator = Self::evaluator_for(&config, &knowledge);
        Self {
            config,
            state,
            knowledge,
            evaluator,
            history: Arc::new(HistoryTable::new()),
            last_outcome: None,
        }
    }

    /// Replaces the knowledge base the engine consults.
    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = Arc::new(knowledge);
        self.evaluator = Self::evaluator_for(&self.config, &self.knowledge);
        self
    }

    fn evaluator_for(config: &EngineConfig, knowledge: &Arc<KnowledgeBase>) -> Evaluator {
        let oracle: Arc<dyn KnowledgeOracle> = knowledge.clone();
        Evaluator::new(config.eval_cache_capacity).with_oracle(oracle)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn turn(&self) -> Color {
        self.state.turn
    }

    pub fn legal_moves(&self) -> Vec<XiangqiMove> {
        let mut moves = legal_moves(&self.state.board, self.state.turn).into_vec();
        moves.sort();
        moves
    }

    pub fn check_game_over(&self) -> Option<GameEnding> {
        let state = &self.state;
        if let (true, Some(winner)) = is_checkmate(&state.board, state.turn) {
            return Some(GameEnding::Checkmate { winner });
        }
        if is_stalemate(&state.board, state.turn) {
            return Some(GameEnding::Stalemate);
        }
        if check_threefold_repetition(state.board.to_key(), state.turn, &state.positions) {
            return Some(GameEnding::Repetition);
        }
        None
    }

    /// Plays `mv` for the side to move. Illegal moves and moves the
    /// referee forbids are rejected without touching the game.
    pub fn apply_move(&mut self, mv: XiangqiMove) -> Result<(), EngineError> {
        if let Some(ending) = self.check_game_over() {
            return Err(EngineError::GameOver { ending });
        }

        let legal = legal_moves(&self.state.board, self.state.turn);
        let mv = legal
            .iter()
            .find(|m| m.from == mv.from && m.to == mv.to)
            .copied()
            .ok_or_else(|| EngineError::InvalidMove {
                notation: mv.to_notation(),
            })?;

        let details = action_kind_of(&self.state.board, &mv);
        if is_forbidden_repetition(self.state.turn, &mv, &details, &self.state.actions) {
            return Err(EngineError::ForbiddenRepetition {
                notation: mv.to_notation(),
            });
        }

        mv.apply(&mut self.state.board)?;
        let state = &mut self.state;
        state.actions.record(Action::new(state.turn, mv, details));
        state.turn = state.turn.opposite();
        state.half_move_count += 1;
        state.positions.push((state.board.to_key(), state.turn));
        state.move_history.push(mv);
        debug!("played {} ({:?})", mv, details.kind);
        Ok(())
    }

    pub fn make_move_from_notation(&mut self, notation: &str) -> Result<XiangqiMove, EngineError> {
        let mv = XiangqiMove::from_notation(&self.state.board, notation)?;
        self.apply_move(mv)?;
        Ok(mv)
    }

    pub fn make_move_from_input(&mut self, input: MoveInput) -> Result<XiangqiMove, EngineError> {
        match input {
            MoveInput::Coordinate { notation } => self.make_move_from_notation(&notation),
            MoveInput::UseEngine => self.make_best_move(),
        }
    }

    /// Searches the current game position without playing the result.
    pub fn best_move(&self) -> SearchOutcome {
        self.find_best_move(&self.state.request(self.config.time_budget))
    }

    pub fn make_best_move(&mut self) -> Result<XiangqiMove, EngineError> {
        if let Some(ending) = self.check_game_over() {
            return Err(EngineError::GameOver { ending });
        }
        let outcome = self.best_move();
        let best_move = outcome.best_move.ok_or(EngineError::SearchError {
            error: SearchError::NoAvailableMoves,
        })?;
        self.last_outcome = Some(outcome);
        self.apply_move(best_move)?;
        Ok(best_move)
    }

    pub fn last_outcome(&self) -> Option<&SearchOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_move(&self) -> Option<XiangqiMove> {
        self.state.move_history.last().copied()
    }

    pub fn opening_name(&self) -> Option<String> {
        self.knowledge.opening_name(&self.state.move_history)
    }

    /// Picks a move for `request.mover`: precomputed knowledge first, then
    /// tree search, then a random legal move. Never fails while a legal
    /// move exists.
    pub fn find_best_move(&self, request: &SearchRequest) -> SearchOutcome {
        let started = Instant::now();
        let legal = legal_moves(request.board, request.mover);
        if legal.is_empty() {
            info!("{} has no legal moves", request.mover);
            return SearchOutcome::empty();
        }

        let mut outcome = self
            .knowledge_move(request, &legal)
            .or_else(|| self.search_move(request, started))
            .unwrap_or_else(|| {
                warn!(
                    "search produced no move for {}, playing a random legal move",
                    request.mover
                );
                let allowed: Vec<XiangqiMove> = legal
                    .iter()
                    .copied()
                    .filter(|mv| !is_forbidden(request, mv))
                    .collect();
                let pool: &[XiangqiMove] = if allowed.is_empty() { &legal } else { &allowed };
                let mv = pool[fastrand::usize(..pool.len())];
                SearchOutcome {
                    fallback: true,
                    ..SearchOutcome::from_source(mv, MoveSource::RandomFallback)
                }
            });

        outcome.elapsed = started.elapsed();
        if let (Some(mv), Some(source)) = (outcome.best_move, outcome.source) {
            info!("{} plays {} from {} in {:?}", request.mover, mv, source, outcome.elapsed);
        }
        outcome
    }

    fn knowledge_move(&self, request: &SearchRequest, legal: &[XiangqiMove]) -> Option<SearchOutcome> {
        let oracle: &dyn KnowledgeOracle = self.knowledge.as_ref();
        let (board, mover, hmc) = (request.board, request.mover, request.half_move_count);

        let validate = |suggested: Option<XiangqiMove>, source: MoveSource| -> Option<SearchOutcome> {
            let suggested = suggested?;
            match legal
                .iter()
                .find(|mv| mv.from == suggested.from && mv.to == suggested.to)
            {
                Some(mv) if is_forbidden(request, mv) => {
                    warn!("discarding forbidden {} suggestion {}", source, mv);
                    None
                }
                Some(mv) => Some(SearchOutcome::from_source(*mv, source)),
                None => {
                    warn!("discarding illegal {} suggestion {}", source, suggested);
                    None
                }
            }
        };

        if hmc < BOOK_HALF_MOVES {
            let suggestion = oracle.opening_move(board, mover, request.kifu);
            if let Some(outcome) = validate(suggestion, MoveSource::OpeningBook) {
                return Some(outcome);
            }
        }

        let kill_move = oracle.kill_pattern_move(board, mover);
        if let Some(outcome) = validate(kill_move, MoveSource::KillPattern) {
            return Some(outcome);
        }

        if game_progress(board, hmc) >= ENDGAME_PROGRESS && hmc >= ENDGAME_MIN_HALF_MOVES {
            return validate(oracle.endgame_move(board, mover), MoveSource::Endgame);
        }
        None
    }

    fn search_move(&self, request: &SearchRequest, started: Instant) -> Option<SearchOutcome> {
        let progress = game_progress(request.board, request.half_move_count);
        let total = request.time_budget.as_secs_f64();

        let use_mcts = self.config.use_mcts
            && self.config.search_depth.is_none()
            && progress < ENDGAME_PROGRESS
            && total > MCTS_MIN_BUDGET_SECS;
        if use_mcts {
            if let Some(outcome) = self.monte_carlo_move(request, total) {
                return Some(outcome);
            }
        }

        let remaining = total - started.elapsed().as_secs_f64() - SEARCH_OVERHEAD_SECS;
        self.alpha_beta_move(request, progress, remaining)
    }

    fn monte_carlo_move(&self, request: &SearchRequest, total_secs: f64) -> Option<SearchOutcome> {
        let share = if request.half_move_count < MCTS_EARLY_HALF_MOVES {
            MCTS_EARLY_BUDGET_SHARE
        } else {
            MCTS_BUDGET_SHARE
        };
        let config = MctsConfig {
            exploration: self.config.mcts_exploration,
            max_simulations: self.config.mcts_simulations,
            rollout_depth: ROLLOUT_DEPTH,
            time_budget: Duration::from_secs_f64(total_secs * share),
            seed: self
                .config
                .seed
                .map(|seed| seed ^ request.half_move_count as u64),
        };
        debug!("running mcts with {:?}", config);

        let mut mcts = MonteCarloTreeSearch::new(config, &self.evaluator);
        let mv = mcts.search(request.board, request.mover, request.half_move_count);
        match mv {
            Some(mv) if is_forbidden(request, &mv) => {
                warn!("mcts chose forbidden repetition {}, falling back to alpha-beta", mv);
                None
            }
            Some(mv) => Some(SearchOutcome {
                simulations: mcts.simulations(),
                ..SearchOutcome::from_source(mv, MoveSource::MonteCarlo)
            }),
            None => {
                warn!("mcts produced no move, falling back to alpha-beta");
                None
            }
        }
    }

    fn alpha_beta_move(
        &self,
        request: &SearchRequest,
        progress: f64,
        remaining_secs: f64,
    ) -> Option<SearchOutcome> {
        let depth = self
            .config
            .search_depth
            .unwrap_or_else(|| depth_limit(progress, remaining_secs));
        let mut context = SearchContext::with_parallel(depth, self.config.parallel)
            .with_tt_capacity(self.config.tt_capacity)
            .with_history(self.history.clone());
        if self.config.search_depth.is_none() {
            // An exhausted budget gets no search at all.
            let floor = MIN_ALPHA_BETA_SECS.min(request.time_budget.as_secs_f64());
            context.set_time_limit(Some(Duration::from_secs_f64(remaining_secs.max(floor))));
        }
        self.history.age();

        let mut state = SearchState::with_history(
            request.board.clone(),
            request.mover,
            request.half_move_count,
            request.positions.to_vec(),
            request.actions.clone(),
        );
        match alpha_beta_search(&mut context, &mut state, &self.evaluator) {
            Ok(mv) => Some(SearchOutcome {
                score: context.last_score(),
                depth_reached: context.depth_reached(),
                nodes: context.searched_position_count(),
                ..SearchOutcome::from_source(mv, MoveSource::AlphaBeta)
            }),
            Err(error) => {
                warn!("alpha-beta search failed at depth {}: {}", depth, error);
                None
            }
        }
    }
}

/// True when playing `mv` would repeat a perpetual check or chase the
/// mover has already made too often.
fn is_forbidden(request: &SearchRequest, mv: &XiangqiMove) -> bool {
    let details = action_kind_of(request.board, mv);
    is_forbidden_repetition(request.mover, mv, &details, request.actions)
}
