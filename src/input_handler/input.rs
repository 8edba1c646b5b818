//! Move input parsing for interactive play.

use std::io::{self, BufRead};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static COORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^([a-i][0-9])-?([a-i][0-9])$").expect("COORD_RE regex should be valid")
});

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("io error: {error:?}")]
    IOError { error: String },
    #[error("invalid input: {input:?}")]
    InvalidInput { input: String },
    #[error("user exited")]
    UserExit,
}

#[derive(Debug, PartialEq)]
pub enum MoveInput {
    /// Four-character coordinate notation, normalized (no separator).
    Coordinate { notation: String },
    UseEngine,
}

impl FromStr for MoveInput {
    type Err = InputError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim().to_lowercase();
        match trimmed.as_str() {
            "quit" | "exit" | "q" => return Err(InputError::UserExit),
            "engine" | "hint" => return Ok(MoveInput::UseEngine),
            _ => {}
        }

        if let Some(caps) = COORD_RE.captures(&trimmed) {
            return Ok(MoveInput::Coordinate {
                notation: format!("{}{}", &caps[1], &caps[2]),
            });
        }

        Err(InputError::InvalidInput {
            input: input.to_string(),
        })
    }
}

/// Reads one line from stdin and parses it as a move.
pub fn parse_move_input() -> Result<MoveInput, InputError> {
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| InputError::IOError {
            error: e.to_string(),
        })?;
    if read == 0 {
        return Err(InputError::UserExit);
    }
    input.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            "h7e7".parse::<MoveInput>(),
            Ok(MoveInput::Coordinate {
                notation: "h7e7".to_string()
            })
        );
        assert_eq!(
            " B9-C7 ".parse::<MoveInput>(),
            Ok(MoveInput::Coordinate {
                notation: "b9c7".to_string()
            })
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("engine".parse::<MoveInput>(), Ok(MoveInput::UseEngine));
        assert_eq!("quit".parse::<MoveInput>(), Err(InputError::UserExit));
        assert!("j0a0".parse::<MoveInput>().is_err());
        assert!("e2e4e5".parse::<MoveInput>().is_err());
    }
}
