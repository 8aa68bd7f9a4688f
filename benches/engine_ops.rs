use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use snake2048::engine::{self, Board, Move};
use snake2048::expectimax::evaluate;
use snake2048::transitions::shift_with_moves;
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = Vec::new();
    boards.push(Board::EMPTY);
    let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b {
            b = nb.with_random_tile(&mut rng);
        }
        boards.push(b);
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    engine::new();
    let boards = corpus();
    for (name, dir) in [
        ("shift/left", Move::Left),
        ("shift/right", Move::Right),
        ("shift/up", Move::Up),
        ("shift/down", Move::Down),
    ] {
        c.bench_function(name, |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards {
                    acc ^= bd.shift(dir).raw();
                }
                black_box(acc)
            })
        });
    }
}

fn bench_evaluate(c: &mut Criterion) {
    engine::new();
    let boards = corpus();
    c.bench_function("evaluate", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                acc += evaluate(bd);
            }
            black_box(acc)
        })
    });
}

fn bench_transitions(c: &mut Criterion) {
    engine::new();
    let boards = corpus();
    c.bench_function("shift_with_moves/left", |bch| {
        bch.iter(|| {
            let mut acc = 0usize;
            for &bd in &boards {
                acc += shift_with_moves(bd, Move::Left).1.len();
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_shift, bench_evaluate, bench_transitions);
criterion_main!(benches);
