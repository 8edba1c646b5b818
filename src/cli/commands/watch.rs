//! Watch command - watch the computer play against itself.

use std::time::Duration;

use structopt::StructOpt;
use xiangqi::game::input_source::EngineInput;
use xiangqi::game::renderer::StatsRenderer;
use xiangqi::input_handler::fen::{FenPosition, STARTING_POSITION_FEN};

use super::util::{create_config, run_game_loop, validate_position, SearchOptions};
use super::Command;

#[derive(StructOpt)]
pub struct WatchArgs {
    #[structopt(short, long, default_value = "3", help = "Seconds the engine gets per move")]
    pub time: f64,
    #[structopt(long = "fen", default_value = STARTING_POSITION_FEN)]
    pub position: FenPosition,
    #[structopt(long, default_value = "200", help = "Stop after this many half moves")]
    pub max_moves: usize,
    #[structopt(
        long = "delay",
        default_value = "1000",
        help = "Delay between moves in milliseconds"
    )]
    pub delay_ms: u64,
    #[structopt(long)]
    pub seed: Option<u64>,
}

impl Command for WatchArgs {
    fn execute(self) {
        if !validate_position(&self.position) {
            return;
        }
        let config = create_config(SearchOptions {
            time_secs: self.time,
            seed: self.seed,
            ..SearchOptions::default()
        });
        run_game_loop(
            EngineInput,
            StatsRenderer {
                delay_between_moves: Some(Duration::from_millis(self.delay_ms)),
            },
            config,
            self.position,
            Some(self.max_moves),
        );
    }
}
