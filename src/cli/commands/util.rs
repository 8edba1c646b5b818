//! Shared utilities for CLI commands.

use std::path::PathBuf;
use std::time::Duration;

use xiangqi::game::engine::{Engine, EngineConfig};
use xiangqi::game::input_source::InputSource;
use xiangqi::game::r#loop::GameLoop;
use xiangqi::game::renderer::GameRenderer;
use xiangqi::input_handler::fen::FenPosition;

/// Search flags shared by every command that asks the engine for moves.
#[derive(Default)]
pub(crate) struct SearchOptions {
    pub time_secs: f64,
    pub depth: Option<u8>,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub book_dir: Option<PathBuf>,
}

pub(crate) fn create_config(options: SearchOptions) -> EngineConfig {
    EngineConfig {
        time_budget: Duration::from_secs_f64(options.time_secs.max(0.0)),
        search_depth: options.depth,
        seed: options.seed,
        parallel: options.parallel,
        knowledge_dir: options.book_dir,
        ..EngineConfig::default()
    }
}

/// Rejects positions no game can reach, such as a side with three
/// chariots.
pub(crate) fn validate_position(position: &FenPosition) -> bool {
    match position.board.check_piece_count_legality() {
        Ok(()) => true,
        Err(error) => {
            eprintln!("Invalid position: {}", error);
            false
        }
    }
}

pub(crate) fn run_game_loop<I, R>(
    input_source: I,
    renderer: R,
    config: EngineConfig,
    position: FenPosition,
    max_moves: Option<usize>,
) where
    I: InputSource,
    R: GameRenderer,
{
    let engine = Engine::with_position(config, position);
    let game = GameLoop::with_engine(input_source, renderer, engine);
    let mut game = match max_moves {
        Some(max_moves) => game.with_max_moves(max_moves),
        None => game,
    };
    game.run();
}
