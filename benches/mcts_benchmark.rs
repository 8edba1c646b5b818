use std::time::Duration;

use xiangqi::board::color::Color;
use xiangqi::board::Board;
use xiangqi::evaluate::Evaluator;
use xiangqi::mcts::{MctsConfig, MonteCarloTreeSearch};

use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let evaluator = Evaluator::default();
    c.bench_function("mcts 200 simulations from the start", |b| {
        b.iter(|| {
            let config = MctsConfig {
                max_simulations: 200,
                time_budget: Duration::from_secs(60),
                seed: Some(1),
                ..MctsConfig::default()
            };
            let mut mcts = MonteCarloTreeSearch::new(config, &evaluator);
            mcts.search(&Board::starting_position(), Color::Red, 0)
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = criterion_benchmark
}
criterion_main!(benches);
