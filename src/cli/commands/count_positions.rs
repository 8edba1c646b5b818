//! Count positions command - count possible positions at a given depth.

use structopt::StructOpt;
use xiangqi::game::position_counter::{run_count_positions, CountPositionsStrategy};
use xiangqi::input_handler::fen::{FenPosition, STARTING_POSITION_FEN};

use super::Command;

#[derive(StructOpt)]
pub struct CountPositionsArgs {
    #[structopt(short, long, default_value = "4")]
    pub depth: u8,
    #[structopt(short, long, default_value = "all")]
    pub strategy: CountPositionsStrategy,
    #[structopt(long = "fen", default_value = STARTING_POSITION_FEN)]
    pub position: FenPosition,
}

impl Command for CountPositionsArgs {
    fn execute(self) {
        run_count_positions(
            self.depth,
            self.strategy,
            self.position.board,
            self.position.turn,
        );
    }
}
