use xiangqi::alpha_beta_searcher::{alpha_beta_search, SearchContext, SearchState};
use xiangqi::board::color::Color;
use xiangqi::board::Board;
use xiangqi::evaluate::Evaluator;
use xiangqi::xiangqi_position;

use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("alpha beta depth 3 from the start", |b| {
        b.iter(|| search(Board::starting_position(), 3, false))
    });
    c.bench_function("alpha beta depth 3 from the start, parallel", |b| {
        b.iter(|| search(Board::starting_position(), 3, true))
    });
    c.bench_function("alpha beta mate in 1", |b| {
        b.iter(|| search(mate_in_one(), 3, false))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = criterion_benchmark
}
criterion_main!(benches);

fn mate_in_one() -> Board {
    xiangqi_position! {
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
    }
}

fn search(board: Board, depth: u8, parallel: bool) {
    let mut context = SearchContext::with_parallel(depth, parallel);
    let mut state = SearchState::new(board, Color::Red);
    let evaluator = Evaluator::default();
    let _ = alpha_beta_search(&mut context, &mut state, &evaluator);
}
