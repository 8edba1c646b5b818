use log::warn;

use crate::evaluate::GameEnding;
use crate::game::engine::{Engine, EngineConfig};
use crate::input_handler::InputError;

use super::input_source::InputSource;
use super::renderer::GameRenderer;

pub struct GameLoop<I: InputSource, R: GameRenderer> {
    engine: Engine,
    input: I,
    renderer: R,
    max_moves: Option<usize>,
}

impl<I: InputSource, R: GameRenderer> GameLoop<I, R> {
    pub fn new(input: I, renderer: R, config: EngineConfig) -> Self {
        Self::with_engine(input, renderer, Engine::with_config(config))
    }

    pub fn with_engine(input: I, renderer: R, engine: Engine) -> Self {
        Self {
            engine,
            input,
            renderer,
            max_moves: None,
        }
    }

    /// Stops the game after this many half moves.
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = Some(max_moves);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Plays until the game ends, the move limit is hit, or the user
    /// quits. Returns how the game ended, if it did.
    pub fn run(&mut self) -> Option<GameEnding> {
        let mut moves_played = 0;
        loop {
            if let Some(ending) = self.engine.check_game_over() {
                self.renderer.render(&self.engine);
                match ending {
                    GameEnding::Checkmate { winner } => println!("Checkmate! {} wins.", winner),
                    GameEnding::Stalemate => println!("Stalemate! {} cannot move.", self.engine.turn()),
                    GameEnding::Repetition => println!("Draw by repetition!"),
                }
                return Some(ending);
            }
            if self.max_moves.map_or(false, |max| moves_played >= max) {
                println!("Move limit reached.");
                return None;
            }

            self.renderer.render(&self.engine);

            match self.input.get_move(self.engine.turn()) {
                Ok(Some(input)) => match self.engine.make_move_from_input(input) {
                    Ok(_) => {
                        moves_played += 1;
                        if let Some(delay) = self.renderer.frame_delay() {
                            std::thread::sleep(delay);
                        }
                    }
                    Err(error) => println!("error: {}", error),
                },
                Ok(None) => println!("Invalid input"),
                Err(InputError::UserExit) => return None,
                Err(error) => {
                    warn!("could not read a move: {}", error);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::color::Color;
    use crate::game::engine::GameState;
    use crate::game::input_source::EngineInput;
    use crate::game::renderer::StatsRenderer;
    use crate::xiangqi_position;

    fn config() -> EngineConfig {
        EngineConfig {
            search_depth: Some(3),
            use_mcts: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_engine_finishes_a_mate() {
        let board = xiangqi_position! {
            ...k.....
            .........
            .........
            .........
            .........
            .........
            .........
            .......R.
            .........
            ....K....
        };
        let engine = Engine::with_state(config(), GameState::new(board, Color::Red, 40));
        let mut game = GameLoop::with_engine(
            EngineInput,
            StatsRenderer {
                delay_between_moves: None,
            },
            engine,
        );

        assert_eq!(game.run(), Some(GameEnding::Checkmate { winner: Color::Red }));
        assert_eq!(game.engine().state().move_history().len(), 1);
    }

    #[test]
    fn test_move_limit() {
        let mut game = GameLoop::new(
            EngineInput,
            StatsRenderer {
                delay_between_moves: None,
            },
            EngineConfig {
                search_depth: Some(1),
                ..config()
            },
        )
        .with_max_moves(2);

        assert_eq!(game.run(), None);
        assert_eq!(game.engine().state().half_move_count(), 2);
    }
}
