use std::fmt;

use super::color::Color;
use super::error::NotationError;

pub const ROWS: i8 = 10;
pub const COLS: i8 = 9;
pub const SQUARE_COUNT: usize = 90;

/// A (row, col) coordinate. Row 0 is black's back rank, row 9 is red's.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(row: i8, col: i8) -> bool {
        (0..ROWS).contains(&row) && (0..COLS).contains(&col)
    }

    pub fn is_valid(&self) -> bool {
        Self::in_bounds(self.row, self.col)
    }

    pub fn index(&self) -> usize {
        (self.row as usize) * (COLS as usize) + self.col as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::new((index / COLS as usize) as i8, (index % COLS as usize) as i8)
    }

    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Square> {
        let (row, col) = (self.row + d_row, self.col + d_col);
        Self::in_bounds(row, col).then(|| Square::new(row, col))
    }

    /// Point reflection through the board center: (r, c) -> (9 - r, 8 - c).
    pub fn mirrored(&self) -> Self {
        Self::new(ROWS - 1 - self.row, COLS - 1 - self.col)
    }

    pub fn in_palace(&self, color: Color) -> bool {
        let rows = match color {
            Color::Red => 7..=9,
            Color::Black => 0..=2,
        };
        rows.contains(&self.row) && (3..=5).contains(&self.col)
    }

    /// True when the square lies on the opponent's half of the board.
    pub fn is_across_river(&self, color: Color) -> bool {
        match color {
            Color::Red => self.row < 5,
            Color::Black => self.row > 4,
        }
    }

    pub fn to_notation(&self) -> String {
        format!("{}{}", (b'a' + self.col as u8) as char, self.row)
    }

    pub fn from_notation(notation: &str) -> Result<Self, NotationError> {
        let bytes = notation.as_bytes();
        if bytes.len() != 2 {
            return Err(NotationError::InvalidSquare {
                notation: notation.to_string(),
            });
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'i').contains(&file) || !rank.is_ascii_digit() {
            return Err(NotationError::InvalidSquare {
                notation: notation.to_string(),
            });
        }
        Ok(Square::new((rank - b'0') as i8, (file - b'a') as i8))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_notation())
    }
}
