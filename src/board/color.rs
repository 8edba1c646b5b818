use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;

/// Red moves first and occupies rows 5..=9; black occupies rows 0..=4.
#[derive(Clone, Copy, PartialEq, Debug, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    pub fn opposite(&self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Scores are computed from red's point of view, so red is the
    /// maximizing side.
    pub fn maximize_score(&self) -> bool {
        matches!(self, Color::Red)
    }

    /// Row delta of a forward pawn step.
    pub fn forward(&self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Color::Red)
    }

    pub fn to_fen(&self) -> char {
        match self {
            Color::Red => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color_str = match self {
            Color::Red => "red",
            Color::Black => "black",
        };
        write!(f, "{}", color_str)
    }
}

// used for parsing cli args
type ParseError = &'static str;
impl FromStr for Color {
    type Err = ParseError;
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "red" => Ok(Color::Red),
            "black" => Ok(Color::Black),
            "random" => Ok(Color::random()),
            _ => Err("invalid color; options are: red, black, random"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random() {
        assert!(Color::ALL.contains(&Color::random()));
    }

    #[test]
    fn test_parse_red() {
        assert_eq!(Color::Red, Color::from_str("red").unwrap());
    }

    #[test]
    fn test_parse_black() {
        assert_eq!(Color::Black, Color::from_str("black").unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Color::from_str("white").is_err());
    }

    #[test]
    fn test_forward_direction() {
        assert_eq!(Color::Red.forward(), -1);
        assert_eq!(Color::Black.forward(), 1);
        assert_eq!(Color::Red.opposite(), Color::Black);
    }
}
