//! Iterative-deepening alpha-beta search with quiescence, a transposition
//! table, killer moves and history-weighted move ordering.

mod history_table;
mod killer_moves;
mod move_orderer;
mod search;
mod transposition_table;

#[cfg(test)]
mod tests;

pub use history_table::HistoryTable;
pub use move_orderer::MoveOrderer;
pub use search::{alpha_beta_search, SearchContext, SearchError, SearchState, MATE_THRESHOLD};
pub use transposition_table::{BoundType, Probe, TTEntry, TranspositionTable, DEFAULT_TT_CAPACITY};

/// Capture plies explored past the nominal depth.
pub const QUIESCENCE_DEPTH: u8 = 3;
/// No search goes deeper than this, whatever the phase or configuration.
pub const ABSOLUTE_MAX_DEPTH: u8 = 10;

/// Iterative-deepening ceiling for a game phase and the seconds left for
/// the move. Later phases search deeper; short clocks search shallower.
pub fn depth_limit(progress: f64, remaining_secs: f64) -> u8 {
    let depth = if remaining_secs < 0.5 {
        1
    } else if progress < 0.8 {
        if remaining_secs < 4.0 {
            3
        } else {
            4
        }
    } else if progress < 1.8 {
        if remaining_secs < 6.0 {
            4
        } else {
            5
        }
    } else if remaining_secs < 8.0 {
        5
    } else {
        7
    };
    depth.min(ABSOLUTE_MAX_DEPTH)
}
