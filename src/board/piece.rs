use super::color::Color;

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, PartialOrd, Ord)]
pub enum Piece {
    King,
    Advisor,
    Elephant,
    Horse,
    Chariot,
    Cannon,
    Pawn,
}

impl Piece {
    pub const ALL: [Piece; 7] = [
        Piece::King,
        Piece::Advisor,
        Piece::Elephant,
        Piece::Horse,
        Piece::Chariot,
        Piece::Cannon,
        Piece::Pawn,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The chariot, horse and cannon are the attacking pieces that the
    /// evaluator and the move orderer treat as "major".
    pub fn is_major(&self) -> bool {
        matches!(self, Piece::Chariot | Piece::Horse | Piece::Cannon)
    }

    /// Most pieces of this kind a side may have on the board.
    pub fn max_count(&self) -> u8 {
        match self {
            Piece::King => 1,
            Piece::Pawn => 5,
            _ => 2,
        }
    }

    pub fn to_fen_char(&self, color: Color) -> char {
        let c = match self {
            Piece::King => 'k',
            Piece::Advisor => 'a',
            Piece::Elephant => 'b',
            Piece::Horse => 'n',
            Piece::Chariot => 'r',
            Piece::Cannon => 'c',
            Piece::Pawn => 'p',
        };
        match color {
            Color::Red => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Accepts both the `n`/`b` and the `h`/`e` letterings for horse and
    /// elephant.
    pub fn from_fen_char(c: char) -> Option<(Piece, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'k' => Piece::King,
            'a' => Piece::Advisor,
            'b' | 'e' => Piece::Elephant,
            'n' | 'h' => Piece::Horse,
            'r' => Piece::Chariot,
            'c' => Piece::Cannon,
            'p' => Piece::Pawn,
            _ => return None,
        };
        Some((piece, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fen_chars() {
        assert_eq!(Piece::Horse.to_fen_char(Color::Red), 'N');
        assert_eq!(Piece::Elephant.to_fen_char(Color::Black), 'b');
        assert_eq!(Piece::from_fen_char('H'), Some((Piece::Horse, Color::Red)));
        assert_eq!(
            Piece::from_fen_char('e'),
            Some((Piece::Elephant, Color::Black))
        );
        assert_eq!(Piece::from_fen_char('q'), None);
    }

    #[test]
    fn test_every_piece_round_trips_through_its_char() {
        for piece in Piece::ALL {
            for color in Color::ALL {
                let c = piece.to_fen_char(color);
                assert_eq!(Piece::from_fen_char(c), Some((piece, color)));
            }
        }
    }
}
