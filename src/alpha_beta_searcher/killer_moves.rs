//! Killer move storage using thread-local storage for parallel search.

use std::cell::RefCell;

use thread_local::ThreadLocal;

use crate::xiangqi_move::XiangqiMove;

type KillerMovePair = [Option<XiangqiMove>; 2];
type KillerMovesVec = Vec<KillerMovePair>;

/// Up to two quiet moves per ply that caused a cutoff elsewhere in the
/// tree. Each search thread keeps its own table, so root-parallel search
/// never contends on it.
pub(crate) struct KillerMovesManager {
    max_ply: usize,
    killers: ThreadLocal<RefCell<KillerMovesVec>>,
}

impl KillerMovesManager {
    pub fn new(max_ply: u8) -> Self {
        Self {
            max_ply: max_ply as usize,
            killers: ThreadLocal::new(),
        }
    }

    fn local(&self) -> &RefCell<KillerMovesVec> {
        self.killers
            .get_or(|| RefCell::new(vec![[None, None]; self.max_ply + 1]))
    }

    /// Newest killer goes first; an already stored move is not duplicated.
    pub fn store(&self, ply: u8, killer: XiangqiMove) {
        let mut killers = self.local().borrow_mut();
        if let Some(slot) = killers.get_mut(ply as usize) {
            if slot[0] == Some(killer) {
                return;
            }
            slot[1] = slot[0].take();
            slot[0] = Some(killer);
        }
    }

    pub fn get(&self, ply: u8) -> KillerMovePair {
        self.local()
            .borrow()
            .get(ply as usize)
            .copied()
            .unwrap_or([None, None])
    }

    pub fn is_killer(&self, ply: u8, mv: &XiangqiMove) -> bool {
        self.get(ply).contains(&Some(*mv))
    }

    pub fn clear(&mut self) {
        self.killers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn moves() -> (XiangqiMove, XiangqiMove, XiangqiMove) {
        let board = Board::starting_position();
        (
            XiangqiMove::from_notation(&board, "h7e7").unwrap(),
            XiangqiMove::from_notation(&board, "b9c7").unwrap(),
            XiangqiMove::from_notation(&board, "a6a5").unwrap(),
        )
    }

    #[test]
    fn test_keeps_two_newest() {
        let manager = KillerMovesManager::new(4);
        let (a, b, c) = moves();
        manager.store(2, a);
        manager.store(2, b);
        manager.store(2, c);
        assert_eq!(manager.get(2), [Some(c), Some(b)]);
        assert!(!manager.is_killer(2, &a));
        assert_eq!(manager.get(1), [None, None]);
    }

    #[test]
    fn test_no_duplicates_and_out_of_range() {
        let manager = KillerMovesManager::new(2);
        let (a, b, _) = moves();
        manager.store(1, a);
        manager.store(1, b);
        manager.store(1, b);
        assert_eq!(manager.get(1), [Some(b), Some(a)]);
        manager.store(9, a);
        assert_eq!(manager.get(9), [None, None]);
    }

    #[test]
    fn test_clear() {
        let mut manager = KillerMovesManager::new(2);
        let (a, _, _) = moves();
        manager.store(0, a);
        manager.clear();
        assert_eq!(manager.get(0), [None, None]);
    }
}
