//! Calculate best move command - determine the best move from a position.

use std::path::PathBuf;

use structopt::StructOpt;
use xiangqi::game::engine::Engine;
use xiangqi::input_handler::fen::FenPosition;

use super::util::{create_config, validate_position, SearchOptions};
use super::Command;

#[derive(StructOpt)]
pub struct CalculateBestMoveArgs {
    #[structopt(long = "fen")]
    pub position: FenPosition,
    #[structopt(short, long, default_value = "5", help = "Seconds to search")]
    pub time: f64,
    #[structopt(short, long, help = "Fixed alpha-beta depth; disables the time limit")]
    pub depth: Option<u8>,
    #[structopt(long, parse(from_os_str), help = "Directory with opening and endgame JSON files")]
    pub book_dir: Option<PathBuf>,
    #[structopt(short, long, help = "Search root moves in parallel")]
    pub parallel: bool,
    #[structopt(long)]
    pub seed: Option<u64>,
}

impl Command for CalculateBestMoveArgs {
    fn execute(self) {
        if !validate_position(&self.position) {
            return;
        }
        let config = create_config(SearchOptions {
            time_secs: self.time,
            depth: self.depth,
            seed: self.seed,
            parallel: self.parallel,
            book_dir: self.book_dir,
        });
        let engine = Engine::with_position(config, self.position);

        let outcome = engine.best_move();
        match outcome.best_move {
            Some(best_move) => {
                println!("{}", best_move);
                if outcome.fallback {
                    eprintln!("warning: the search failed, this move was picked at random");
                }
            }
            None => eprintln!("There are no legal moves in the given position."),
        }
    }
}
