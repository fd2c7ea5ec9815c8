use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tandem_core::content::{PlayerSlot, TileContent};
use tandem_core::controller::GameController;
use tandem_core::interaction::Interaction;
use tandem_core::map::Map;
use tandem_core::position::{Direction, Position};

const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

fn level(size: u32) -> (Map, Position) {
    let mut map = Map::filled(size, size, PlayerSlot::One).unwrap();
    let start = Position::new(1, 1);
    // Sprinkle blocks and a belt so steps exercise pushes and cascades.
    for i in (3..size as i32 - 1).step_by(4) {
        map.place(Position::new(i, i), TileContent::block(PlayerSlot::One, None))
            .unwrap();
        map.place(
            Position::new(i, 1),
            TileContent::conveyor(PlayerSlot::One, Direction::South),
        )
        .unwrap();
    }
    map.place(start, TileContent::player(PlayerSlot::One)).unwrap();
    (map, start)
}

fn bench_single_step(c: &mut Criterion) {
    let (map, start) = level(16);

    c.bench_function("single_step", |b| {
        b.iter(|| {
            let mut controller = GameController::new(map.clone());
            let step = Interaction::step(start, Direction::East, controller.id());
            black_box(controller.trigger_action(step).unwrap());
        })
    });
}

fn bench_random_walk(c: &mut Criterion) {
    let (map, start) = level(32);

    c.bench_function("random_walk_100", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let mut controller = GameController::new(map.clone());
            let mut player = start;
            for _ in 0..100 {
                let direction = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
                let step = Interaction::step(player, direction, controller.id());
                if controller.trigger_action(step).unwrap().is_committed() {
                    player = player.step(direction);
                }
                controller.apply_pending().unwrap();
            }
            black_box(player)
        })
    });
}

criterion_group!(benches, bench_single_step, bench_random_walk);
criterion_main!(benches);
