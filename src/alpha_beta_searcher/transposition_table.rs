//! Transposition table for caching search results within one search call.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::MATE_THRESHOLD;
use crate::xiangqi_move::XiangqiMove;

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub score: i32,
    pub depth: u8,
    pub bound_type: BoundType,
    pub best_move: Option<XiangqiMove>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BoundType {
    Exact,
    Lower,
    Upper,
}

/// Result of a probe: either a score usable as-is, or a possibly narrowed
/// window to continue searching with.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Probe {
    Cutoff(i32),
    Window(i32, i32),
}

pub const DEFAULT_TT_CAPACITY: usize = 1 << 18;

/// Keyed by the position key including the side to move. The side being
/// optimized for is fixed for the lifetime of a table, so it is not part
/// of the key.
///
/// Mate scores are stored relative to the stored position rather than the
/// root, so a mate found at one ply reads back correctly at another.
pub struct TranspositionTable {
    table: DashMap<u64, TTEntry>,
    hits: AtomicUsize,
    depth_rejected: AtomicUsize,
    overwrites: AtomicUsize,
    shallow_discarded: AtomicUsize,
}

fn to_stored(score: i32, ply: u8) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply as i32
    } else if score <= -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

fn from_stored(score: i32, ply: u8) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TT_CAPACITY)
    }
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            table: DashMap::with_capacity(capacity),
            hits: AtomicUsize::new(0),
            depth_rejected: AtomicUsize::new(0),
            overwrites: AtomicUsize::new(0),
            shallow_discarded: AtomicUsize::new(0),
        }
    }

    /// Keeps an existing deeper entry; a result of equal or greater depth
    /// replaces it. `ply` is the distance of `hash` from the search root.
    pub fn store(
        &self,
        hash: u64,
        score: i32,
        depth: u8,
        ply: u8,
        bound_type: BoundType,
        best_move: Option<XiangqiMove>,
    ) {
        let entry = TTEntry {
            score: to_stored(score, ply),
            depth,
            bound_type,
            best_move,
        };

        match self.table.entry(hash) {
            Entry::Occupied(mut existing) => {
                if existing.get().depth > depth {
                    self.shallow_discarded.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                existing.insert(entry);
                self.overwrites.fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    /// Entries searched shallower than `depth` are ignored. Bound entries
    /// tighten the window and cut off once it closes.
    pub fn probe(&self, hash: u64, depth: u8, ply: u8, alpha: i32, beta: i32) -> Probe {
        let entry = match self.table.get(&hash) {
            Some(entry) => TTEntry {
                score: from_stored(entry.score, ply),
                ..*entry
            },
            None => return Probe::Window(alpha, beta),
        };
        if entry.depth < depth {
            self.depth_rejected.fetch_add(1, Ordering::Relaxed);
            return Probe::Window(alpha, beta);
        }

        let (alpha, beta) = match entry.bound_type {
            BoundType::Exact => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Probe::Cutoff(entry.score);
            }
            BoundType::Lower => (alpha.max(entry.score), beta),
            BoundType::Upper => (alpha, beta.min(entry.score)),
        };
        if alpha >= beta {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Probe::Cutoff(entry.score)
        } else {
            Probe::Window(alpha, beta)
        }
    }

    pub fn get_move(&self, hash: u64) -> Option<XiangqiMove> {
        self.table.get(&hash).and_then(|entry| entry.best_move)
    }

    pub fn clear(&self) {
        self.table.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.depth_rejected.store(0, Ordering::Relaxed);
        self.overwrites.store(0, Ordering::Relaxed);
        self.shallow_discarded.store(0, Ordering::Relaxed);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    pub fn depth_rejected(&self) -> usize {
        self.depth_rejected.load(Ordering::Relaxed)
    }

    pub fn overwrites(&self) -> usize {
        self.overwrites.load(Ordering::Relaxed)
    }

    pub fn shallow_discarded(&self) -> usize {
        self.shallow_discarded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_entry_cuts_off() {
        let table = TranspositionTable::new(16);
        table.store(42, 120, 3, 0, BoundType::Exact, None);
        assert_eq!(table.probe(42, 3, 0, -1000, 1000), Probe::Cutoff(120));
        assert_eq!(table.probe(42, 2, 0, -1000, 1000), Probe::Cutoff(120));
        assert_eq!(table.hits(), 2);
    }

    #[test]
    fn test_shallow_entry_is_not_trusted() {
        let table = TranspositionTable::new(16);
        table.store(42, 120, 2, 0, BoundType::Exact, None);
        assert_eq!(table.probe(42, 3, 0, -1000, 1000), Probe::Window(-1000, 1000));
        assert_eq!(table.depth_rejected(), 1);
    }

    #[test]
    fn test_bounds_narrow_the_window() {
        let table = TranspositionTable::new(16);
        table.store(1, 50, 4, 0, BoundType::Lower, None);
        assert_eq!(table.probe(1, 4, 0, -100, 100), Probe::Window(50, 100));
        assert_eq!(table.probe(1, 4, 0, -100, 40), Probe::Cutoff(50));

        table.store(2, -50, 4, 0, BoundType::Upper, None);
        assert_eq!(table.probe(2, 4, 0, -100, 100), Probe::Window(-100, -50));
        assert_eq!(table.probe(2, 4, 0, -40, 100), Probe::Cutoff(-50));
    }

    #[test]
    fn test_deeper_entry_survives_shallow_store() {
        let table = TranspositionTable::new(16);
        table.store(9, 300, 5, 0, BoundType::Exact, None);
        table.store(9, -20, 2, 0, BoundType::Exact, None);
        assert_eq!(table.probe(9, 5, 0, -1000, 1000), Probe::Cutoff(300));
        assert_eq!(table.shallow_discarded(), 1);
        assert_eq!(table.overwrites(), 0);

        table.store(9, 80, 5, 0, BoundType::Exact, None);
        assert_eq!(
            table.probe(9, 5, 0, -1000, 1000),
            Probe::Cutoff(80),
            "a result of equal depth is newer and wins"
        );
        assert_eq!(table.overwrites(), 1);
    }

    #[test]
    fn test_mate_scores_follow_the_probing_ply() {
        let table = TranspositionTable::new(16);
        let mate_at_root = MATE_THRESHOLD + 500;
        // Mate in 3 plies from the root, found while searching ply 2.
        table.store(11, mate_at_root - 3, 4, 2, BoundType::Exact, None);
        assert_eq!(table.probe(11, 4, 2, -i32::MAX, i32::MAX), Probe::Cutoff(mate_at_root - 3));
        assert_eq!(
            table.probe(11, 4, 6, -i32::MAX, i32::MAX),
            Probe::Cutoff(mate_at_root - 7),
            "the same mate reached four plies later is four plies further away"
        );

        table.store(12, -mate_at_root + 3, 4, 2, BoundType::Exact, None);
        assert_eq!(table.probe(12, 4, 0, -i32::MAX, i32::MAX), Probe::Cutoff(-mate_at_root + 1));

        table.store(13, 250, 4, 2, BoundType::Exact, None);
        assert_eq!(table.probe(13, 4, 9, -i32::MAX, i32::MAX), Probe::Cutoff(250));
    }

    #[test]
    fn test_clear() {
        let table = TranspositionTable::new(16);
        table.store(7, 1, 1, 0, BoundType::Exact, None);
        table.store(7, 2, 1, 0, BoundType::Exact, None);
        assert_eq!(table.overwrites(), 1);
        assert_eq!(table.size(), 1);
        table.clear();
        assert_eq!(table.size(), 0);
        assert_eq!(table.get_move(7), None);
    }
}
