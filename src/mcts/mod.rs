//! Monte Carlo tree search.
//!
//! The tree lives in an arena: nodes are stored in one `Vec` and refer to
//! each other by index. A node's statistics are kept from the point of view
//! of the side to move at that node, so a parent prefers children whose
//! mover is doing badly.

use std::time::{Duration, Instant};

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
#[cfg(feature = "instrumentation")]
use tracing::instrument;

use crate::board::color::Color;
use crate::board::Board;
use crate::evaluate::Evaluator;
use crate::rules::{is_king_in_check, legal_moves};
use crate::xiangqi_move::{MoveList, XiangqiMove};

pub const DEFAULT_EXPLORATION: f64 = 1.414;
pub const DEFAULT_MAX_SIMULATIONS: usize = 1000;
/// Plies played out before a rollout is scored by the evaluator.
pub const ROLLOUT_DEPTH: usize = 30;

/// Evaluation beyond which an unfinished rollout counts as a likely result.
const ROLLOUT_EVAL_THRESHOLD: i32 = 200;
const ROLLOUT_LIKELY_RESULT: f64 = 0.8;

#[derive(Clone, Debug)]
pub struct MctsConfig {
    pub exploration: f64,
    pub max_simulations: usize,
    pub rollout_depth: usize,
    pub time_budget: Duration,
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: DEFAULT_EXPLORATION,
            max_simulations: DEFAULT_MAX_SIMULATIONS,
            rollout_depth: ROLLOUT_DEPTH,
            time_budget: Duration::from_secs(3),
            seed: None,
        }
    }
}

struct Node {
    board: Board,
    mover: Color,
    half_move_count: u32,
    parent: Option<usize>,
    mv: Option<XiangqiMove>,
    children: Vec<usize>,
    untried: MoveList,
    wins: f64,
    visits: u32,
    /// Result for `mover` if the game is over here.
    terminal: Option<f64>,
}

impl Node {
    fn new(
        board: Board,
        mover: Color,
        half_move_count: u32,
        parent: Option<usize>,
        mv: Option<XiangqiMove>,
    ) -> Self {
        let untried = legal_moves(&board, mover);
        let terminal = if untried.is_empty() {
            Some(if is_king_in_check(&board, mover) { -1.0 } else { 0.0 })
        } else {
            None
        };
        Self {
            board,
            mover,
            half_move_count,
            parent,
            mv,
            children: Vec::new(),
            untried,
            wins: 0.0,
            visits: 0,
            terminal,
        }
    }

    fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }
}

pub struct MonteCarloTreeSearch<'a> {
    config: MctsConfig,
    evaluator: &'a Evaluator,
    rng: StdRng,
    nodes: Vec<Node>,
    simulations: usize,
}

impl<'a> MonteCarloTreeSearch<'a> {
    pub fn new(config: MctsConfig, evaluator: &'a Evaluator) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            evaluator,
            rng,
            nodes: Vec::new(),
            simulations: 0,
        }
    }

    /// Simulations completed by the last search.
    pub fn simulations(&self) -> usize {
        self.simulations
    }

    /// Visits of each root child after the last search, by move.
    pub fn root_visits(&self) -> Vec<(XiangqiMove, u32)> {
        match self.nodes.first() {
            Some(root) => root
                .children
                .iter()
                .filter_map(|&child| {
                    let node = &self.nodes[child];
                    node.mv.map(|mv| (mv, node.visits))
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Runs simulations until the budget or the simulation cap is reached
    /// and returns the most visited root move. `None` only when `mover` has
    /// no legal move.
    #[cfg_attr(feature = "instrumentation", instrument(skip_all))]
    pub fn search(&mut self, board: &Board, mover: Color, half_move_count: u32) -> Option<XiangqiMove> {
        let start = Instant::now();
        self.nodes.clear();
        self.simulations = 0;
        self.nodes
            .push(Node::new(board.clone(), mover, half_move_count, None, None));

        while self.simulations < self.config.max_simulations && start.elapsed() < self.config.time_budget {
            let mut index = self.select(0);
            if self.nodes[index].terminal.is_none() && !self.nodes[index].is_fully_expanded() {
                index = self.expand(index);
            }
            let value = match self.nodes[index].terminal {
                Some(value) => value,
                None => self.rollout(index),
            };
            self.backpropagate(index, value);
            self.simulations += 1;
        }

        debug!(
            "mcts: {} simulations in {:?}, {} nodes",
            self.simulations,
            start.elapsed(),
            self.nodes.len()
        );

        self.best_root_move()
    }

    fn select(&self, mut index: usize) -> usize {
        loop {
            let node = &self.nodes[index];
            if node.terminal.is_some() || !node.is_fully_expanded() {
                return index;
            }
            match self.best_child_uct(index) {
                Some(child) => index = child,
                None => return index,
            }
        }
    }

    fn best_child_uct(&self, index: usize) -> Option<usize> {
        let node = &self.nodes[index];
        if let Some(&unvisited) = node.children.iter().find(|&&c| self.nodes[c].visits == 0) {
            return Some(unvisited);
        }
        let log_visits = if node.visits > 0 {
            (node.visits as f64).ln()
        } else {
            0.0
        };
        let uct = |child: usize| {
            let child = &self.nodes[child];
            let visits = child.visits as f64;
            -child.wins / visits + self.config.exploration * (log_visits / visits).sqrt()
        };
        node.children
            .iter()
            .copied()
            .max_by(|&a, &b| uct(a).partial_cmp(&uct(b)).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Adds one child for an untried move, preferring the oracle's priority
    /// move when it is among them.
    fn expand(&mut self, index: usize) -> usize {
        let priority = self.evaluator.oracle().and_then(|oracle| {
            let node = &self.nodes[index];
            oracle.priority_move(&node.board, node.mover)
        });

        let node = &mut self.nodes[index];
        let position = priority
            .and_then(|mv| node.untried.iter().position(|m| *m == mv))
            .unwrap_or_else(|| self.rng.gen_range(0..node.untried.len()));
        let mv = node.untried.swap_remove(position);

        let mut board = node.board.clone();
        if mv.apply(&mut board).is_err() {
            return index;
        }
        let child = Node::new(
            board,
            node.mover.opposite(),
            node.half_move_count + 1,
            Some(index),
            Some(mv),
        );
        let child_index = self.nodes.len();
        self.nodes.push(child);
        self.nodes[index].children.push(child_index);
        child_index
    }

    /// Plays random moves from the node and scores the result for the
    /// node's mover.
    fn rollout(&mut self, index: usize) -> f64 {
        let perspective = self.nodes[index].mover;
        let mut board = self.nodes[index].board.clone();
        let mut mover = perspective;
        let mut half_move_count = self.nodes[index].half_move_count;

        for _ in 0..self.config.rollout_depth {
            let moves = legal_moves(&board, mover);
            let mv = match moves.choose(&mut self.rng) {
                Some(mv) => *mv,
                None if is_king_in_check(&board, mover) => {
                    return if mover == perspective { -1.0 } else { 1.0 };
                }
                None => return 0.0,
            };
            if mv.apply(&mut board).is_err() {
                return 0.0;
            }
            mover = mover.opposite();
            half_move_count += 1;
        }

        let eval = self.evaluator.evaluate(&board, perspective, half_move_count);
        if eval > ROLLOUT_EVAL_THRESHOLD {
            ROLLOUT_LIKELY_RESULT
        } else if eval < -ROLLOUT_EVAL_THRESHOLD {
            -ROLLOUT_LIKELY_RESULT
        } else {
            0.0
        }
    }

    /// `value` is the result for the mover at `index`; it flips sign at
    /// every level on the way up.
    fn backpropagate(&mut self, index: usize, value: f64) {
        let mut current = Some(index);
        let mut value = value;
        while let Some(i) = current {
            let node = &mut self.nodes[i];
            node.visits += 1;
            node.wins += value;
            value = -value;
            current = node.parent;
        }
    }

    fn best_root_move(&mut self) -> Option<XiangqiMove> {
        let root = self.nodes.first()?;
        if root.children.is_empty() {
            let moves: Vec<XiangqiMove> = root.untried.iter().copied().collect();
            return moves.choose(&mut self.rng).copied();
        }

        let most_visited = root
            .children
            .iter()
            .copied()
            .max_by_key(|&c| self.nodes[c].visits)
            .filter(|&c| self.nodes[c].visits > 0);
        let chosen = match most_visited {
            Some(child) => child,
            None => {
                let children = root.children.clone();
                *children.choose(&mut self.rng)?
            }
        };
        self.nodes[chosen].mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xiangqi_position;

    fn config(max_simulations: usize, time_budget: Duration) -> MctsConfig {
        MctsConfig {
            max_simulations,
            time_budget,
            seed: Some(7),
            ..MctsConfig::default()
        }
    }

    /// Black's king on e0 may only step to d0; everything else is covered.
    fn single_reply() -> Board {
        xiangqi_position! {
            ....k....
            R........
            .........
            .........
            .........
            .........
            .........
            .........
            .........
            .....K...
        }
    }

    #[test]
    fn test_single_legal_move_is_chosen() {
        let board = single_reply();
        println!("{}", board);
        let moves = legal_moves(&board, Color::Black);
        assert_eq!(moves.len(), 1, "position should leave one reply: {:?}", moves);

        let evaluator = Evaluator::default();
        for (sims, budget) in [(0, Duration::ZERO), (1, Duration::from_secs(5)), (50, Duration::from_secs(5))] {
            let mut mcts = MonteCarloTreeSearch::new(config(sims, budget), &evaluator);
            let best = mcts.search(&board, Color::Black, 30);
            assert_eq!(best, Some(moves[0]), "with {} simulations", sims);
        }
    }

    #[test]
    fn test_simulation_cap_and_visits() {
        let board = Board::starting_position();
        let evaluator = Evaluator::default();
        let mut mcts = MonteCarloTreeSearch::new(config(40, Duration::from_secs(60)), &evaluator);
        let best = mcts.search(&board, Color::Red, 0);

        assert!(best.is_some());
        assert_eq!(mcts.simulations(), 40);
        let visits: u32 = mcts.root_visits().iter().map(|(_, v)| v).sum();
        assert_eq!(visits, 40, "every simulation passes through one root child");
        assert!(legal_moves(&board, Color::Red).contains(&best.unwrap()));
    }

    #[test]
    fn test_no_moves_returns_none() {
        let board = xiangqi_position! {
            ...k.....
            .........
            .........
            .........
            .........
            .........
            .........
            ...R.....
            .........
            ....K....
        };
        println!("{}", board);
        let evaluator = Evaluator::default();
        let mut mcts = MonteCarloTreeSearch::new(config(10, Duration::from_secs(1)), &evaluator);
        assert_eq!(mcts.search(&board, Color::Black, 20), None);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let board = Board::starting_position();
        let evaluator = Evaluator::default();

        let mut first = MonteCarloTreeSearch::new(config(30, Duration::from_secs(60)), &evaluator);
        let mut second = MonteCarloTreeSearch::new(config(30, Duration::from_secs(60)), &evaluator);
        assert_eq!(
            first.search(&board, Color::Red, 0),
            second.search(&board, Color::Red, 0)
        );
        assert_eq!(first.root_visits(), second.root_visits());
    }

    #[test]
    fn test_backpropagation_flips_sign() {
        let evaluator = Evaluator::default();
        let mut mcts = MonteCarloTreeSearch::new(config(0, Duration::ZERO), &evaluator);
        mcts.nodes
            .push(Node::new(Board::starting_position(), Color::Red, 0, None, None));
        let child = mcts.expand(0);
        mcts.backpropagate(child, 1.0);

        assert_eq!(mcts.nodes[child].wins, 1.0);
        assert_eq!(mcts.nodes[0].wins, -1.0);
        assert_eq!(mcts.nodes[0].visits, 1);
        assert_eq!(mcts.nodes[child].mover, Color::Black);
    }
}
