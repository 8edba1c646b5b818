//! Play command - play a game against the computer.

use structopt::StructOpt;
use xiangqi::board::color::Color;
use xiangqi::game::input_source::ConditionalInput;
use xiangqi::game::renderer::ConditionalStatsRenderer;
use xiangqi::input_handler::fen::{FenPosition, STARTING_POSITION_FEN};

use super::util::{create_config, run_game_loop, validate_position, SearchOptions};
use super::Command;

#[derive(StructOpt)]
pub struct PlayArgs {
    #[structopt(short, long, default_value = "5", help = "Seconds the engine gets per move")]
    pub time: f64,
    #[structopt(short, long, help = "Fixed alpha-beta depth for the engine")]
    pub depth: Option<u8>,
    #[structopt(short = "c", long = "color", default_value = "random")]
    pub color: Color,
    #[structopt(long = "fen", default_value = STARTING_POSITION_FEN)]
    pub position: FenPosition,
}

impl Command for PlayArgs {
    fn execute(self) {
        if !validate_position(&self.position) {
            return;
        }
        println!("You are playing {}.", self.color);
        let config = create_config(SearchOptions {
            time_secs: self.time,
            depth: self.depth,
            ..SearchOptions::default()
        });
        run_game_loop(
            ConditionalInput {
                human_color: self.color,
            },
            ConditionalStatsRenderer {
                human_color: self.color,
            },
            config,
            self.position,
            None,
        );
    }
}
