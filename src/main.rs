mod cli;

use cli::commands::Command;
use cli::Xiangqi;
use structopt::StructOpt;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    #[cfg(feature = "instrumentation")]
    xiangqi::instrumentation::init_tracing();

    Xiangqi::from_args().execute();

    #[cfg(feature = "instrumentation")]
    xiangqi::instrumentation::print_timing_statistics();
}
