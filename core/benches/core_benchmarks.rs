use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use mapforge_core::math::Vec3;
use mapforge_core::undo::{
    Action, ActionHistory, ChunkKey, MemoryWorld, ObjectInstanceCache, ObjectOp, TileKey, resolve,
};

/// A 5x5 chunk brush footprint, roughly what a large sculpt brush covers.
fn brush_chunks() -> Vec<ChunkKey> {
    let tile = TileKey::new(32, 32);
    (0..5)
        .flat_map(|x| (0..5).map(move |z| ChunkKey::new(tile, x, z)))
        .collect()
}

fn brush_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    for key in brush_chunks() {
        world.load_chunk(key);
    }
    world
}

fn raise(world: &mut MemoryWorld, keys: &[ChunkKey]) {
    for &key in keys {
        if let Some(state) = world.chunk_mut(key) {
            for p in state.terrain.positions.iter_mut() {
                p.y += 0.5;
            }
        }
    }
}

/// A finished terrain action over the whole brush footprint.
fn finished_brush_action(world: &mut MemoryWorld, keys: &[ChunkKey]) -> Action {
    let mut action = Action::new();
    for &key in keys {
        let _ = action.register_chunk_terrain_change(&*world, key);
    }
    raise(world, keys);
    let _ = action.finish(&*world);
    action
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn bench_register_terrain_brush(c: &mut Criterion) {
    let world = brush_world();
    let keys = brush_chunks();
    c.bench_function("register_terrain_25_chunks", |b| {
        b.iter(|| {
            let mut action = Action::new();
            for &key in &keys {
                let _ = action.register_chunk_terrain_change(&world, black_box(key));
            }
            black_box(action)
        });
    });
}

fn bench_register_repeated(c: &mut Criterion) {
    let world = brush_world();
    let keys = brush_chunks();
    c.bench_function("register_terrain_25_chunks_x10_dabs", |b| {
        b.iter(|| {
            let mut action = Action::new();
            for _ in 0..10 {
                for &key in &keys {
                    let _ = action.register_chunk_terrain_change(&world, black_box(key));
                }
            }
            black_box(action)
        });
    });
}

fn bench_register_all_categories(c: &mut Criterion) {
    let world = brush_world();
    let keys = brush_chunks();
    c.bench_function("register_all_25_chunks", |b| {
        b.iter(|| {
            let mut action = Action::new();
            for &key in &keys {
                let _ = action.register_all_chunk_changes(&world, black_box(key));
            }
            black_box(action)
        });
    });
}

// ---------------------------------------------------------------------------
// Finish / undo / redo
// ---------------------------------------------------------------------------

fn bench_finish_brush(c: &mut Criterion) {
    let keys = brush_chunks();
    let world = brush_world();
    c.bench_function("finish_terrain_25_chunks", |b| {
        b.iter_batched(
            || {
                let mut action = Action::new();
                for &key in &keys {
                    let _ = action.register_chunk_terrain_change(&world, key);
                }
                action
            },
            |mut action| {
                let _ = action.finish(&world);
                black_box(action)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_undo_redo_brush(c: &mut Criterion) {
    let keys = brush_chunks();
    let mut world = brush_world();
    let mut action = finished_brush_action(&mut world, &keys);
    c.bench_function("undo_redo_terrain_25_chunks", |b| {
        b.iter(|| {
            let _ = action.undo(&mut world, false);
            let _ = action.undo(&mut world, true);
        });
    });
}

fn bench_history_session(c: &mut Criterion) {
    let keys = brush_chunks();
    c.bench_function("history_20_strokes_undo_all", |b| {
        b.iter_batched(
            || (brush_world(), ActionHistory::new(100)),
            |(mut world, mut history)| {
                for _ in 0..20 {
                    let action = history.begin_action();
                    for &key in &keys[..9] {
                        let _ = action.register_chunk_terrain_change(&world, key);
                    }
                    raise(&mut world, &keys[..9]);
                    let _ = history.end_action(&world);
                }
                while history.undo(&mut world).is_ok() {}
                black_box(world)
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

fn bench_object_lifecycle(c: &mut Criterion) {
    c.bench_function("object_place_move_undo_redo_100", |b| {
        b.iter_batched(
            || {
                let mut world = MemoryWorld::new();
                let mut action = Action::new();
                for i in 0..100 {
                    let pos = Vec3::new(i as f32, 0.0, 0.0);
                    let uid = world.place_object(ObjectInstanceCache::new("tree.m2", pos));
                    let _ = action.register_object_added(&world, uid);
                    let _ = action.register_object_transformed(&world, uid);
                    if let Some(object) = world.object_mut(uid) {
                        object.pos.y = 10.0;
                    }
                }
                let _ = action.finish(&world);
                (world, action)
            },
            |(mut world, mut action)| {
                let _ = action.undo(&mut world, false);
                let _ = action.undo(&mut world, true);
                black_box(world)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_resolve_op_log(c: &mut Criterion) {
    let ops: Vec<ObjectOp> = [ObjectOp::Added]
        .into_iter()
        .chain(std::iter::repeat_n(ObjectOp::Transformed, 64))
        .chain([ObjectOp::Removed, ObjectOp::Added])
        .collect();
    c.bench_function("resolve_op_log_67", |b| {
        b.iter(|| black_box(resolve(black_box(&ops))));
    });
}

criterion_group!(
    benches,
    bench_register_terrain_brush,
    bench_register_repeated,
    bench_register_all_categories,
    bench_finish_brush,
    bench_undo_redo_brush,
    bench_history_session,
    bench_object_lifecycle,
    bench_resolve_op_log,
);
criterion_main!(benches);
