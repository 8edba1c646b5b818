//! File-backed knowledge: opening lines, studied endgames and kill
//! patterns.
//!
//! All data is authored from red's side. Lookups for black mirror the
//! board (and the game's move list) into red's orientation first and
//! mirror the answer back.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use super::book::{Book, BookMove, OpeningLine};
use super::KnowledgeOracle;
use crate::board::color::Color;
use crate::board::Board;
use crate::input_handler::fen::{parse_fen, FenParseError};
use crate::xiangqi_move::XiangqiMove;

pub const OPENINGS_FILE: &str = "openings.json";
pub const ENDGAMES_FILE: &str = "endgames.json";
pub const KILL_PATTERNS_FILE: &str = "kill_patterns.json";

/// Score reported for a studied endgame that is a known win for the mover.
pub const KNOWN_WIN_SCORE: i32 = 10_000;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },
    #[error("Invalid move {notation:?} in {context}")]
    InvalidMove { notation: String, context: String },
    #[error("Invalid position in {context}: {source}")]
    InvalidPosition {
        context: String,
        source: FenParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn score(&self) -> i32 {
        match self {
            Outcome::Win => KNOWN_WIN_SCORE,
            Outcome::Draw => 0,
            Outcome::Loss => -KNOWN_WIN_SCORE,
        }
    }
}

#[derive(Deserialize)]
struct OpeningsFile {
    openings: Vec<OpeningLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndgameStudy {
    pub name: String,
    pub fen: String,
    #[serde(default)]
    pub best_move: Option<String>,
    pub outcome: Outcome,
}

#[derive(Deserialize)]
struct EndgamesFile {
    endgames: Vec<EndgameStudy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KillPattern {
    pub name: String,
    pub fen: String,
    pub solution: Vec<String>,
}

#[derive(Deserialize)]
struct KillPatternsFile {
    kill_patterns: Vec<KillPattern>,
}

struct StudiedEndgame {
    name: String,
    best_move: Option<BookMove>,
    outcome: Outcome,
}

struct KillSequence {
    name: String,
    solution: Vec<BookMove>,
}

/// The standard `KnowledgeOracle`. Studied endgames and kill patterns are
/// matched by exact placement with red to move.
pub struct KnowledgeBase {
    book: Book,
    endgames: FxHashMap<u64, StudiedEndgame>,
    kill_patterns: FxHashMap<u64, KillSequence>,
    rng: Mutex<fastrand::Rng>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::with_book(Book::default())
    }
}

impl KnowledgeBase {
    /// A knowledge base with the built-in opening lines only.
    pub fn new() -> Self {
        Default::default()
    }

    /// A knowledge base that knows nothing.
    pub fn empty() -> Self {
        Self::with_book(Book::new())
    }

    fn with_book(book: Book) -> Self {
        Self {
            book,
            endgames: FxHashMap::default(),
            kill_patterns: FxHashMap::default(),
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        if let Ok(rng) = self.rng.lock() {
            rng.seed(seed);
        }
        self
    }

    /// Built-in openings plus whatever of `openings.json`, `endgames.json`
    /// and `kill_patterns.json` exists in `directory`.
    pub fn load(directory: &Path) -> Result<Self, KnowledgeError> {
        let mut knowledge = Self::new();

        if let Some(json) = read_if_present(&directory.join(OPENINGS_FILE))? {
            let count = knowledge.add_openings_json(&json)?;
            info!("loaded {} opening lines from {:?}", count, directory);
        }
        if let Some(json) = read_if_present(&directory.join(ENDGAMES_FILE))? {
            let count = knowledge.add_endgames_json(&json)?;
            info!("loaded {} endgame studies from {:?}", count, directory);
        }
        if let Some(json) = read_if_present(&directory.join(KILL_PATTERNS_FILE))? {
            let count = knowledge.add_kill_patterns_json(&json)?;
            info!("loaded {} kill patterns from {:?}", count, directory);
        }

        Ok(knowledge)
    }

    pub fn add_openings_json(&mut self, json: &str) -> Result<usize, KnowledgeError> {
        let file: OpeningsFile =
            serde_json::from_str(json).map_err(|source| KnowledgeError::Json {
                context: OPENINGS_FILE.to_string(),
                source,
            })?;
        let count = file.openings.len();
        for line in file.openings {
            let context = format!("opening {:?}", line.name);
            let moves = line.moves.clone();
            self.book
                .add_line(line)
                .map_err(|_| KnowledgeError::InvalidMove {
                    notation: moves,
                    context,
                })?;
        }
        Ok(count)
    }

    pub fn add_endgames_json(&mut self, json: &str) -> Result<usize, KnowledgeError> {
        let file: EndgamesFile =
            serde_json::from_str(json).map_err(|source| KnowledgeError::Json {
                context: ENDGAMES_FILE.to_string(),
                source,
            })?;
        let count = file.endgames.len();
        for study in file.endgames {
            self.add_endgame(study)?;
        }
        Ok(count)
    }

    pub fn add_kill_patterns_json(&mut self, json: &str) -> Result<usize, KnowledgeError> {
        let file: KillPatternsFile =
            serde_json::from_str(json).map_err(|source| KnowledgeError::Json {
                context: KILL_PATTERNS_FILE.to_string(),
                source,
            })?;
        let count = file.kill_patterns.len();
        for pattern in file.kill_patterns {
            self.add_kill_pattern(pattern)?;
        }
        Ok(count)
    }

    pub fn add_endgame(&mut self, study: EndgameStudy) -> Result<(), KnowledgeError> {
        let context = format!("endgame {:?}", study.name);
        let (key, mirrored) = normalized_key_from_fen(&study.fen, &context)?;
        let best_move = study
            .best_move
            .as_deref()
            .map(|notation| parse_book_move(notation, mirrored, &context))
            .transpose()?;
        self.endgames.insert(
            key,
            StudiedEndgame {
                name: study.name,
                best_move,
                outcome: study.outcome,
            },
        );
        Ok(())
    }

    pub fn add_kill_pattern(&mut self, pattern: KillPattern) -> Result<(), KnowledgeError> {
        let context = format!("kill pattern {:?}", pattern.name);
        let (key, mirrored) = normalized_key_from_fen(&pattern.fen, &context)?;
        let solution = pattern
            .solution
            .iter()
            .map(|notation| parse_book_move(notation, mirrored, &context))
            .collect::<Result<Vec<_>, _>>()?;
        self.kill_patterns.insert(
            key,
            KillSequence {
                name: pattern.name,
                solution,
            },
        );
        Ok(())
    }

    pub fn endgame_count(&self) -> usize {
        self.endgames.len()
    }

    pub fn kill_pattern_count(&self) -> usize {
        self.kill_patterns.len()
    }

    /// Name of the book line the game is following, if any.
    pub fn opening_name(&self, kifu: &[XiangqiMove]) -> Option<String> {
        let line = normalized_line(kifu);
        self.book.get_line(&line)
    }

    /// Full kill-pattern solution for the mover, oriented to the real board.
    pub fn kill_pattern_solution(&self, board: &Board, mover: Color) -> Option<Vec<BookMove>> {
        let pattern = self.kill_patterns.get(&normalized_key(board, mover))?;
        debug!("kill pattern {:?} matches", pattern.name);
        Some(
            pattern
                .solution
                .iter()
                .map(|mv| denormalize(*mv, mover))
                .collect(),
        )
    }

    fn pick<T>(&self, choices: &[T]) -> Option<usize> {
        if choices.is_empty() {
            return None;
        }
        let index = match self.rng.lock() {
            Ok(rng) => rng.usize(..choices.len()),
            Err(_) => 0,
        };
        Some(index)
    }
}

impl KnowledgeOracle for KnowledgeBase {
    fn opening_move(
        &self,
        board: &Board,
        mover: Color,
        kifu: &[XiangqiMove],
    ) -> Option<XiangqiMove> {
        let mirror = match kifu.first() {
            Some(first) => first.piece.1 == Color::Black,
            None => mover == Color::Black,
        };
        let book_mover = if mirror { mover.opposite() } else { mover };
        let expected = if kifu.len() % 2 == 0 {
            Color::Red
        } else {
            Color::Black
        };
        if book_mover != expected {
            return None;
        }

        // the book only applies when the moves really lead from the
        // standard layout to this board
        let line = normalized_line(kifu);
        let mut replayed = Board::starting_position();
        for book_move in &line {
            if replayed
                .apply_move(book_move.from_square(), book_move.to_square())
                .is_err()
            {
                return None;
            }
        }
        let normalized = if mirror { board.mirrored() } else { board.clone() };
        if replayed != normalized {
            return None;
        }

        let continuations = self.book.get_next_moves(&line);
        let (choice, line_name) = continuations.get(self.pick(&continuations)?)?.clone();
        if let Some(name) = line_name {
            debug!("book line {:?} completed", name);
        }
        let actual = if mirror { choice.mirrored() } else { choice };
        to_move(board, actual, mover)
    }

    fn kill_pattern_move(&self, board: &Board, mover: Color) -> Option<XiangqiMove> {
        let solution = self.kill_pattern_solution(board, mover)?;
        to_move(board, *solution.first()?, mover)
    }

    fn endgame_move(&self, board: &Board, mover: Color) -> Option<XiangqiMove> {
        let study = self.endgames.get(&normalized_key(board, mover))?;
        debug!("endgame study {:?} matches", study.name);
        to_move(board, denormalize(study.best_move?, mover), mover)
    }

    fn known_endgame_score(&self, board: &Board, mover: Color) -> Option<i32> {
        self.endgames
            .get(&normalized_key(board, mover))
            .map(|study| study.outcome.score())
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>, KnowledgeError> {
    if !path.exists() {
        warn!("knowledge file {:?} not found, skipping", path);
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Placement key of the board as red would see it with red to move.
fn normalized_key(board: &Board, mover: Color) -> u64 {
    match mover {
        Color::Red => board.to_key(),
        Color::Black => board.mirrored().to_key(),
    }
}

fn normalized_key_from_fen(fen: &str, context: &str) -> Result<(u64, bool), KnowledgeError> {
    let position = parse_fen(fen).map_err(|source| KnowledgeError::InvalidPosition {
        context: context.to_string(),
        source,
    })?;
    let mirrored = position.turn == Color::Black;
    Ok((normalized_key(&position.board, position.turn), mirrored))
}

fn parse_book_move(
    notation: &str,
    mirrored: bool,
    context: &str,
) -> Result<BookMove, KnowledgeError> {
    let book_move =
        BookMove::from_notation(notation).map_err(|_| KnowledgeError::InvalidMove {
            notation: notation.to_string(),
            context: context.to_string(),
        })?;
    Ok(if mirrored {
        book_move.mirrored()
    } else {
        book_move
    })
}

/// The game's moves as the book stores them: red first.
fn normalized_line(kifu: &[XiangqiMove]) -> Vec<BookMove> {
    let mirror = kifu
        .first()
        .map_or(false, |first| first.piece.1 == Color::Black);
    kifu.iter()
        .map(|mv| {
            let book_move = BookMove::from(mv);
            if mirror {
                book_move.mirrored()
            } else {
                book_move
            }
        })
        .collect()
}

fn denormalize(book_move: BookMove, mover: Color) -> BookMove {
    match mover {
        Color::Red => book_move,
        Color::Black => book_move.mirrored(),
    }
}

/// Resolves a book move against the real board; `None` if the origin
/// does not hold one of the mover's pieces.
fn to_move(board: &Board, book_move: BookMove, mover: Color) -> Option<XiangqiMove> {
    match board.get(book_move.from_square()) {
        Some(piece) if piece.1 == mover => Some(XiangqiMove::new(
            book_move.from_square(),
            book_move.to_square(),
            piece,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_handler::fen_serialize::placement_to_fen;
    use crate::xiangqi_position;

    fn play(board: &mut Board, kifu: &mut Vec<XiangqiMove>, notation: &str) {
        let mv = XiangqiMove::from_notation(board, notation).unwrap();
        mv.apply(board).unwrap();
        kifu.push(mv);
    }

    #[test]
    fn test_opening_move_for_red_from_start() {
        let knowledge = KnowledgeBase::new().with_seed(3);
        let board = Board::starting_position();
        let mv = knowledge
            .opening_move(&board, Color::Red, &[])
            .expect("the built-in book covers the first move");
        assert!(
            ["h7e7", "g6g5", "c9e7", "b9c7"].contains(&mv.to_notation().as_str()),
            "unexpected book move {}",
            mv
        );
        assert_eq!(mv.piece.1, Color::Red);
    }

    #[test]
    fn test_opening_move_follows_the_line() {
        let knowledge = KnowledgeBase::new();
        let mut board = Board::starting_position();
        let mut kifu = vec![];
        play(&mut board, &mut kifu, "b9c7");
        println!("{}", board);
        let mv = knowledge.opening_move(&board, Color::Black, &kifu).unwrap();
        assert_eq!(mv.to_notation(), "g3g4");
        assert_eq!(
            knowledge.opening_name(&[kifu[0], mv]),
            Some("Horse Opening".to_string())
        );
    }

    #[test]
    fn test_opening_move_mirrored_when_black_moves_first() {
        let knowledge = KnowledgeBase::new();
        let mut board = Board::starting_position();
        let mut kifu = vec![];
        // red's b9c7 seen from black's side
        play(&mut board, &mut kifu, "h0g2");
        println!("{}", board);
        let mv = knowledge.opening_move(&board, Color::Red, &kifu).unwrap();
        assert_eq!(mv.to_notation(), "c6c5", "mirror of g3g4");
        assert_eq!(mv.piece.1, Color::Red);
    }

    #[test]
    fn test_out_of_book() {
        let knowledge = KnowledgeBase::new();
        let mut board = Board::starting_position();
        let mut kifu = vec![];
        play(&mut board, &mut kifu, "a6a5");
        assert_eq!(knowledge.opening_move(&board, Color::Black, &kifu), None);
        assert_eq!(knowledge.opening_name(&kifu), None);
    }

    #[test]
    fn test_opening_requires_matching_board() {
        let knowledge = KnowledgeBase::new();
        let mut board = Board::starting_position();
        board.remove(crate::board::square::Square::new(0, 0));
        assert_eq!(knowledge.opening_move(&board, Color::Red, &[]), None);
    }

    fn endgame_board() -> Board {
        xiangqi_position! {
            ...k.....
            .........
            .........
            .........
            .........
            .........
            .........
            ....R....
            .........
            .....K...
        }
    }

    #[test]
    fn test_endgame_lookup_both_sides() {
        let mut knowledge = KnowledgeBase::empty();
        let board = endgame_board();
        let fen = format!("{} w", placement_to_fen(&board));
        knowledge
            .add_endgame(EndgameStudy {
                name: "Chariot vs bare king".to_string(),
                fen,
                best_move: Some("e7d7".to_string()),
                outcome: Outcome::Win,
            })
            .unwrap();

        assert_eq!(
            knowledge.known_endgame_score(&board, Color::Red),
            Some(KNOWN_WIN_SCORE)
        );
        let mv = knowledge.endgame_move(&board, Color::Red).unwrap();
        assert_eq!(mv.to_notation(), "e7d7");

        // same study with the colors swapped
        let mirrored = board.mirrored();
        println!("{}", mirrored);
        assert_eq!(
            knowledge.known_endgame_score(&mirrored, Color::Black),
            Some(KNOWN_WIN_SCORE)
        );
        let mv = knowledge.endgame_move(&mirrored, Color::Black).unwrap();
        assert_eq!(mv.to_notation(), "e2f2");
        assert_eq!(mv.piece.1, Color::Black);

        assert_eq!(knowledge.known_endgame_score(&board, Color::Black), None);
    }

    #[test]
    fn test_kill_pattern_from_json() {
        let mut knowledge = KnowledgeBase::empty();
        let board = endgame_board();
        let json = format!(
            r#"{{"kill_patterns": [{{"name": "test", "fen": "{} w - - 0 1", "solution": ["e7d7"]}}]}}"#,
            placement_to_fen(&board)
        );
        assert_eq!(knowledge.add_kill_patterns_json(&json).unwrap(), 1);
        assert_eq!(
            knowledge
                .kill_pattern_move(&board, Color::Red)
                .map(|mv| mv.to_notation()),
            Some("e7d7".to_string())
        );
        assert_eq!(
            knowledge
                .priority_move(&board, Color::Red)
                .map(|mv| mv.to_notation()),
            Some("e7d7".to_string()),
            "kill patterns double as the priority move"
        );
    }

    #[test]
    fn test_openings_json() {
        let mut knowledge = KnowledgeBase::empty();
        let json = r#"{"openings": [{"name": "Edge Pawn", "moves": "a6a5 i3i4"}]}"#;
        assert_eq!(knowledge.add_openings_json(json).unwrap(), 1);
        let mv = knowledge
            .opening_move(&Board::starting_position(), Color::Red, &[])
            .unwrap();
        assert_eq!(mv.to_notation(), "a6a5");
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let mut knowledge = KnowledgeBase::empty();
        assert!(matches!(
            knowledge.add_endgames_json("{not json"),
            Err(KnowledgeError::Json { .. })
        ));
        let json = r#"{"openings": [{"name": "bad", "moves": "zz"}]}"#;
        assert!(matches!(
            knowledge.add_openings_json(json),
            Err(KnowledgeError::InvalidMove { .. })
        ));
    }

    #[test]
    fn test_load_missing_directory_keeps_built_ins() {
        let knowledge = KnowledgeBase::load(Path::new("/nonexistent/knowledge")).unwrap();
        assert_eq!(knowledge.endgame_count(), 0);
        assert_eq!(knowledge.kill_pattern_count(), 0);
        assert!(knowledge
            .opening_move(&Board::starting_position(), Color::Red, &[])
            .is_some());
    }
}
