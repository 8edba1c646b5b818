use std::collections::VecDeque;
use std::fmt;

use crate::board::color::Color;
use crate::board::square::Square;
use crate::board::PieceId;
use crate::xiangqi_move::XiangqiMove;

use super::MAX_ACTION_HISTORY_LENGTH;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Check,
    ChaseUnprotected,
    ChaseProtected,
    Other,
}

/// What an action was aimed at. Two chases only compare equal when the
/// chased piece, its square, the chasing piece and where the chaser came
/// from all match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
    King {
        square: Square,
    },
    Chase {
        target: PieceId,
        at: Square,
        by: PieceId,
        from: Square,
    },
    Nothing,
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::King { square } => {
                write!(f, "check_king_at_{}_{}", square.row, square.col)
            }
            TargetKey::Chase {
                target: (target, target_color),
                at,
                by: (by, by_color),
                from,
            } => write!(
                f,
                "chase_{}_at_{}_{}_by_{}_from_{}_{}",
                target.to_fen_char(*target_color),
                at.row,
                at.col,
                by.to_fen_char(*by_color),
                from.row,
                from.col
            ),
            TargetKey::Nothing => write!(f, "no_specific_target"),
        }
    }
}

/// Classification of a single move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionDetails {
    pub kind: ActionKind,
    pub target: TargetKey,
    /// Placement key of the board after the move.
    pub board_after: u64,
}

impl ActionDetails {
    pub fn other(board_after: u64) -> Self {
        Self {
            kind: ActionKind::Other,
            target: TargetKey::Nothing,
            board_after,
        }
    }
}

/// One recorded move with its classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    pub player: Color,
    pub kind: ActionKind,
    pub target: TargetKey,
    pub board_after: u64,
    pub mv: XiangqiMove,
}

impl Action {
    pub fn new(player: Color, mv: XiangqiMove, details: ActionDetails) -> Self {
        Self {
            player,
            kind: details.kind,
            target: details.target,
            board_after: details.board_after,
            mv,
        }
    }
}

/// Bounded log of recent actions, oldest first.
#[derive(Clone, Debug, Default)]
pub struct ActionHistory {
    actions: VecDeque<Action>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a played action, dropping the oldest entries past the
    /// length limit.
    pub fn record(&mut self, action: Action) {
        self.actions.push_back(action);
        while self.actions.len() > MAX_ACTION_HISTORY_LENGTH {
            self.actions.pop_front();
        }
    }

    /// Appends an action along a searched line. Unlike `record` this never
    /// evicts, so `pop_hypothetical` restores the exact prior state.
    pub fn push_hypothetical(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    pub fn pop_hypothetical(&mut self) -> Option<Action> {
        self.actions.pop_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn last(&self) -> Option<&Action> {
        self.actions.back()
    }
}
