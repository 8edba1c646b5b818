//! Opening book data structures and operations.

use std::fmt::{Display, Formatter};

use log::warn;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::board::error::NotationError;
use crate::board::square::Square;
use crate::xiangqi_move::{parse_squares, XiangqiMove};

/// A move as authored in the book: two squares, no piece. Lines are always
/// written from red's side with red moving first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookMove(Square, Square);

impl BookMove {
    pub fn new(from: Square, to: Square) -> Self {
        BookMove(from, to)
    }

    pub fn from_square(&self) -> Square {
        self.0
    }

    pub fn to_square(&self) -> Square {
        self.1
    }

    pub fn from_notation(notation: &str) -> Result<Self, NotationError> {
        let (from, to) = parse_squares(notation)?;
        Ok(BookMove(from, to))
    }

    pub fn mirrored(&self) -> Self {
        BookMove(self.0.mirrored(), self.1.mirrored())
    }
}

impl From<&XiangqiMove> for BookMove {
    fn from(mv: &XiangqiMove) -> Self {
        BookMove(mv.from, mv.to)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningLine {
    pub name: String,
    /// Space separated coordinate moves, e.g. `h7e7 h0g2`.
    pub moves: String,
}

impl OpeningLine {
    pub fn new(name: &str, moves: &str) -> Self {
        Self {
            name: name.to_string(),
            moves: moves.to_string(),
        }
    }
}

#[derive(Default)]
pub struct BookNode {
    lines: FxHashMap<BookMove, Box<BookNode>>,
    line_name: Option<String>,
}

impl BookNode {
    fn new() -> Self {
        Default::default()
    }
}

pub struct Book {
    root: BookNode,
}

const BUILT_IN_LINES: [(&str, &str); 5] = [
    (
        "Central Cannon vs. Screen Horses",
        "h7e7 h0g2 h9g7 b0c2 i9h9 i0h0",
    ),
    ("Same Direction Cannons", "h7e7 h2e2 h9g7 h0g2 i9h9 i0h0"),
    ("Pawn Opening", "g6g5 c3c4 h9g7 b0c2"),
    ("Elephant Opening", "c9e7 h0g2 h9g7 i0h0"),
    ("Horse Opening", "b9c7 g3g4"),
];

impl Default for Book {
    fn default() -> Self {
        let mut book = Book::new();
        for (name, moves) in BUILT_IN_LINES {
            if let Err(error) = book.add_line(OpeningLine::new(name, moves)) {
                warn!("skipping built-in opening {:?}: {}", name, error);
            }
        }
        book
    }
}

impl Book {
    pub fn new() -> Self {
        Self {
            root: BookNode::default(),
        }
    }

    /// Adds a line to the trie. Nothing is added if any move fails to parse.
    pub fn add_line(&mut self, line: OpeningLine) -> Result<(), NotationError> {
        let moves = line
            .moves
            .split_whitespace()
            .map(BookMove::from_notation)
            .collect::<Result<Vec<_>, _>>()?;
        let moves_count = moves.len();
        if moves_count == 0 {
            return Ok(());
        }

        let mut curr_node = &mut self.root;

        for (i, book_move) in moves.into_iter().enumerate() {
            let next_node = curr_node
                .lines
                .entry(book_move)
                .or_insert_with(|| Box::new(BookNode::new()));

            if i == moves_count - 1 {
                next_node.line_name = Some(line.name.clone());
            }

            curr_node = next_node;
        }
        Ok(())
    }

    /// Continuations stored after `line`, each with the name of the line
    /// it completes (if any).
    pub fn get_next_moves(&self, line: &[BookMove]) -> Vec<(BookMove, Option<String>)> {
        let mut curr_node = &self.root;

        for book_move in line {
            match curr_node.lines.get(book_move) {
                Some(next) => curr_node = next,
                None => return vec![],
            }
        }

        let mut moves: Vec<_> = curr_node
            .lines
            .iter()
            .map(|(move_, node)| (*move_, node.line_name.clone()))
            .collect();
        // hash map order is unspecified; keep choices reproducible
        moves.sort_by_key(|(move_, _)| (move_.0, move_.1));
        moves
    }

    pub fn get_line(&self, line: &[BookMove]) -> Option<String> {
        let mut curr_node = &self.root;
        let mut last_line_name: Option<String> = None;

        for book_move in line {
            curr_node = curr_node.lines.get(book_move)?;
            if curr_node.line_name.is_some() {
                last_line_name.clone_from(&curr_node.line_name);
            }
        }

        last_line_name.or(curr_node.line_name.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.root.lines.is_empty()
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl Display for BookNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut lines = vec![];
        for (move_, node) in self.lines.iter() {
            let mut line = format!("{}", move_);
            if let Some(name) = node.line_name.clone() {
                line.push_str(&format!(" {}", name));
            }
            lines.push(line);
        }
        write!(f, "{}", lines.join("\n"))
    }
}

impl Display for BookMove {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.0.to_notation(), self.1.to_notation())
    }
}
