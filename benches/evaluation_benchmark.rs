use xiangqi::board::color::Color;
use xiangqi::board::Board;
use xiangqi::evaluate::{static_evaluation, Evaluator};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let board = Board::starting_position();
    c.bench_function("static evaluation of the starting position", |b| {
        b.iter(|| static_evaluation(black_box(&board), Color::Red, 0))
    });

    let evaluator = Evaluator::default();
    c.bench_function("cached evaluation of the starting position", |b| {
        b.iter(|| evaluator.evaluate(black_box(&board), Color::Red, 0))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
