//! CLI argument parsing using StructOpt.

use structopt::StructOpt;

use crate::cli::commands::{
    calculate_best_move::CalculateBestMoveArgs, count_positions::CountPositionsArgs,
    play::PlayArgs, watch::WatchArgs,
};

#[derive(StructOpt)]
#[structopt(
    name = "xiangqi",
    about = "A xiangqi (Chinese chess) engine implemented in Rust"
)]
pub enum Xiangqi {
    #[structopt(
        name = "play",
        about = "Play a game against the computer, which gets `--time` seconds per move (default: 5). Your color will be chosen at random unless you specify it with `--color`. The initial position can be given in FEN notation with `--fen` (default: starting position). Enter moves in coordinate notation, e.g. `h7e7`."
    )]
    Play(PlayArgs),
    #[structopt(
        name = "watch",
        about = "Watch the computer play against itself with `--time` seconds per move (default: 3), stopping after `--max-moves` half moves (default: 200). The initial position can be given in FEN notation with `--fen` (default: starting position)."
    )]
    Watch(WatchArgs),
    #[structopt(
        name = "calculate-best-move",
        about = "Determine the best move from a position given in FEN notation with `--fen` (required). The search gets `--time` seconds (default: 5) unless a fixed alpha-beta `--depth` is given."
    )]
    CalculateBestMove(CalculateBestMoveArgs),
    #[structopt(
        name = "count-positions",
        about = "Count the positions reachable in `--depth` half moves (default: 4) and report how long it took. By default every legal line is walked; `--strategy alpha-beta` counts the positions an alpha-beta search visits instead."
    )]
    CountPositions(CountPositionsArgs),
}

impl crate::cli::commands::Command for Xiangqi {
    fn execute(self) {
        macro_rules! execute_command {
            ($($variant:ident($cmd:ident)),+ $(,)?) => {
                match self {
                    $(Self::$variant($cmd) => $cmd.execute(),)+
                }
            };
        }

        execute_command! {
            Play(cmd),
            Watch(cmd),
            CalculateBestMove(cmd),
            CountPositions(cmd),
        }
    }
}
