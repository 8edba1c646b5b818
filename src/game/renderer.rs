use std::time::Duration;

use crate::board::color::Color;
use crate::game::engine::{Engine, SearchOutcome};

pub trait GameRenderer {
    fn render(&self, engine: &Engine);
    fn frame_delay(&self) -> Option<Duration>;
}

fn render_position(engine: &Engine) {
    println!();
    println!("{}", engine.board());
    if let Some(last_move) = engine.last_move() {
        println!("* Last move: {}", last_move);
    }
    if let Some(name) = engine.opening_name() {
        println!("* Opening: {}", name);
    }
    println!("* {} to move", engine.turn());
}

fn format_stats(outcome: &SearchOutcome) -> String {
    let source = outcome
        .source
        .map_or("-".to_string(), |source| source.to_string());
    let work = if outcome.simulations > 0 {
        format!("{} simulations", outcome.simulations)
    } else {
        format!(
            "{} positions (depth: {})",
            outcome.nodes, outcome.depth_reached
        )
    };
    format!(
        "* Source: {}\n* Score: {}\n* Searched: {}\n* Move took: {:?}",
        source,
        outcome.score.map_or("-".to_string(), |s| s.to_string()),
        work,
        outcome.elapsed
    )
}

pub struct SimpleRenderer;

impl GameRenderer for SimpleRenderer {
    fn render(&self, engine: &Engine) {
        render_position(engine);
        println!("Enter your move:");
    }

    fn frame_delay(&self) -> Option<Duration> {
        None
    }
}

pub struct StatsRenderer {
    pub delay_between_moves: Option<Duration>,
}

impl GameRenderer for StatsRenderer {
    fn render(&self, engine: &Engine) {
        render_position(engine);
        if let Some(outcome) = engine.last_outcome() {
            println!("{}", format_stats(outcome));
        }
    }

    fn frame_delay(&self) -> Option<Duration> {
        self.delay_between_moves
    }
}

pub struct ConditionalStatsRenderer {
    pub human_color: Color,
}

impl GameRenderer for ConditionalStatsRenderer {
    fn render(&self, engine: &Engine) {
        render_position(engine);
        if engine.turn() == self.human_color {
            if let Some(outcome) = engine.last_outcome() {
                println!("{}", format_stats(outcome));
            }
            println!("Enter your move (e.g. h7e7), or `engine` for a hint move:");
        }
    }

    fn frame_delay(&self) -> Option<Duration> {
        None
    }
}
