use crate::board::color::Color;
use crate::input_handler::{parse_move_input, InputError, MoveInput};

/// Where the moves of a game come from.
pub trait InputSource {
    /// `Ok(None)` means the input was not understood and should be asked
    /// for again.
    fn get_move(&self, current_turn: Color) -> Result<Option<MoveInput>, InputError>;
}

fn read_human_move() -> Result<Option<MoveInput>, InputError> {
    match parse_move_input() {
        Ok(move_input) => Ok(Some(move_input)),
        Err(InputError::UserExit) => Err(InputError::UserExit),
        Err(error) => {
            log::debug!("rejected input: {}", error);
            Ok(None)
        }
    }
}

pub struct HumanInput;

impl InputSource for HumanInput {
    fn get_move(&self, _current_turn: Color) -> Result<Option<MoveInput>, InputError> {
        read_human_move()
    }
}

pub struct EngineInput;

impl InputSource for EngineInput {
    fn get_move(&self, _current_turn: Color) -> Result<Option<MoveInput>, InputError> {
        Ok(Some(MoveInput::UseEngine))
    }
}

/// A human plays `human_color`, the engine plays the other side.
pub struct ConditionalInput {
    pub human_color: Color,
}

impl InputSource for ConditionalInput {
    fn get_move(&self, current_turn: Color) -> Result<Option<MoveInput>, InputError> {
        if current_turn == self.human_color {
            read_human_move()
        } else {
            Ok(Some(MoveInput::UseEngine))
        }
    }
}
