pub mod alpha_beta_searcher;
pub mod board;
pub mod book;
pub mod evaluate;
pub mod game;
pub mod input_handler;
#[cfg(feature = "instrumentation")]
pub mod instrumentation;
pub mod mcts;
pub mod referee;
pub mod rules;
pub mod xiangqi_move;
