use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetrecs::cli::plan_turn;
use tetrecs::core::{create_piece, detect_full_lines, Game, GameConfig, Grid};

fn bench_turn(c: &mut Criterion) {
    c.bench_function("play_turns_until_stuck", |b| {
        b.iter(|| {
            let mut game = Game::new(GameConfig::with_seed(12345)).unwrap();
            game.start().unwrap();
            for _ in 0..16 {
                let Some(plan) = plan_turn(&game.snapshot()) else {
                    break;
                };
                let _ = game.attempt_placement(black_box(plan.x), black_box(plan.y));
                game.take_events();
            }
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    let mut full = Grid::new(5, 5).unwrap();
    for y in 0..5 {
        for x in 0..5 {
            full.set(x, y, 1).unwrap();
        }
    }

    c.bench_function("detect_full_grid", |b| {
        b.iter(|| detect_full_lines(black_box(&full)))
    });
}

fn bench_can_place(c: &mut Criterion) {
    let grid = Grid::new(5, 5).unwrap();
    let plus = create_piece(2).unwrap();

    c.bench_function("can_place_scan", |b| {
        b.iter(|| {
            let mut legal = 0;
            for y in 0..5 {
                for x in 0..5 {
                    if grid.can_place(black_box(&plus), x, y) {
                        legal += 1;
                    }
                }
            }
            legal
        })
    });
}

fn bench_plan(c: &mut Criterion) {
    let mut game = Game::new(GameConfig::with_seed(12345)).unwrap();
    game.start().unwrap();
    let snapshot = game.snapshot();

    c.bench_function("plan_turn", |b| b.iter(|| plan_turn(black_box(&snapshot))));
}

criterion_group!(
    benches,
    bench_turn,
    bench_line_clear,
    bench_can_place,
    bench_plan
);
criterion_main!(benches);
