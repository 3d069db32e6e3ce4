use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lattice_data::{PackedArray, SparseSet};

#[derive(Debug, Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
}

fn bench_sparse_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("SparseSet");

    group.bench_function("Insert 10k scattered keys", |b| {
        b.iter(|| {
            let mut set = SparseSet::<u32>::new();
            for i in 0..10_000u32 {
                let key = i * 7 % 65_536;
                set.insert(black_box(key), set.len());
            }
            black_box(set.len());
        });
    });

    let mut set = SparseSet::<u32>::new();
    for i in 0..10_000u32 {
        let key = i * 7 % 65_536;
        set.insert(key, set.len());
    }

    group.bench_function("Lookup 10k keys", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for i in 0..10_000u32 {
                let key = i * 7 % 65_536;
                if set.contains(black_box(key)) {
                    hits += 1;
                }
            }
            black_box(hits);
        });
    });

    group.bench_function("Iterate dense pairs", |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for (_, value) in set.iter() {
                sum += value;
            }
            black_box(sum);
        });
    });

    group.finish();
}

fn bench_packed_array(c: &mut Criterion) {
    let mut array = PackedArray::<u32, Position>::new();
    for entity in 0..10_000u32 {
        array.add(
            entity * 3,
            Position {
                x: entity as f32,
                y: -(entity as f32),
            },
        );
    }

    let mut group = c.benchmark_group("PackedArray");

    group.bench_function("Iterate packed components", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for component in array.components() {
                sum += component.x + component.y;
            }
            black_box(sum);
        });
    });

    group.bench_function("Add and remove churn", |b| {
        b.iter(|| {
            let mut churn = PackedArray::<u32, Position>::new();
            for entity in 0..1_000u32 {
                churn.add(entity, Position::default());
            }
            for entity in (0..1_000u32).step_by(2) {
                churn.remove(entity);
            }
            black_box(churn.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sparse_set, bench_packed_array);
criterion_main!(benches);
