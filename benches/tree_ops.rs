//! Benchmarks for tree operations.

use bpindex::{Bptree, Direction};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

fn shuffled_keys(n: usize) -> Vec<i64> {
    let mut keys: Vec<i64> = (0..n as i64).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(1));
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let keys = shuffled_keys(size);

        group.bench_with_input(BenchmarkId::new("Bptree", size), &keys, |b, keys| {
            b.iter(|| {
                let tree: Bptree<i64> = Bptree::new(32, 16, false).unwrap();
                for &k in keys {
                    tree.insert(k).unwrap();
                }
                black_box(tree)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeSet", size), &keys, |b, keys| {
            b.iter(|| {
                let mut set = BTreeSet::new();
                for &k in keys {
                    set.insert(k);
                }
                black_box(set)
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [1_000, 100_000] {
        let keys = shuffled_keys(size);
        let tree: Bptree<i64> = Bptree::new(32, 16, false).unwrap();
        for &k in &keys {
            tree.insert(k).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("exact", size), &keys, |b, keys| {
            b.iter(|| {
                for &k in keys.iter().take(1_000) {
                    black_box(tree.search(&k).unwrap());
                }
            });
        });

        group.bench_function(BenchmarkId::new("nearby_miss", size), |b| {
            b.iter(|| {
                for k in 0..1_000i64 {
                    // Keys are dense, so probe past the top to force misses.
                    let probe = size as i64 + k;
                    black_box(tree.search_nearby(&probe, Direction::ToLeft).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_range_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_scan");

    let keys = shuffled_keys(100_000);
    let tree: Bptree<i64> = Bptree::new(32, 16, false).unwrap();
    for &k in &keys {
        tree.insert(k).unwrap();
    }

    for width in [10usize, 100, 1_000] {
        group.bench_function(BenchmarkId::new("elem_range", width), |b| {
            let cursor = tree.search(&50_000).unwrap().unwrap();
            b.iter(|| black_box(cursor.elem_range(width as isize)));
        });

        group.bench_function(BenchmarkId::new("elem_range_to", width), |b| {
            let cursor = tree.search(&50_000).unwrap().unwrap();
            let bound = 50_000 + width as i64;
            b.iter(|| black_box(cursor.elem_range_to(&bound, Direction::ToRight, usize::MAX)));
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    group.sample_size(20);

    let keys = shuffled_keys(10_000);

    group.bench_function("remove_all_10k", |b| {
        b.iter(|| {
            let tree: Bptree<i64> = Bptree::new(32, 16, false).unwrap();
            for &k in &keys {
                tree.insert(k).unwrap();
            }
            for &k in &keys {
                tree.remove(&k).unwrap();
            }
            black_box(tree)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_search, bench_range_scan, bench_remove);
criterion_main!(benches);
