use core::{iter::Copied, slice};

use criterion::{BenchmarkGroup, BenchmarkId, Criterion, criterion_group, measurement::WallTime};
use itertools::kmerge_by;
use rand::prelude::*;
use resumable_merge::{Checkpoint, Merged, VecCursor};

const ITER_COUNTS: [usize; 8] = [8, 32, 128, 256, 512, 1024, 2048, 4096];

/// `n_iters` consecutive runs of `data`
fn runs(data: &[u64], n_iters: usize) -> impl Iterator<Item = Copied<slice::Iter<'_, u64>>> {
    let it_len = data.len() / n_iters;
    data.chunks(it_len).take(n_iters).map(|it| it.iter().copied())
}

fn compare_with_itertools(group: &mut BenchmarkGroup<'_, WallTime>, data: &[u64]) {
    for n_iters in ITER_COUNTS {
        group.bench_function(BenchmarkId::new("Merged", n_iters), |b| {
            b.iter(|| Merged::new(runs(data, n_iters)).build().into_vec());
        });
        group.bench_function(BenchmarkId::new("Itertools kmerge_by", n_iters), |b| {
            b.iter(|| kmerge_by(runs(data, n_iters), |a: &u64, b: &u64| a < b).collect::<Vec<_>>());
        });
    }
}

fn bench_itertools(c: &mut Criterion) {
    let n_els = 2_usize.pow(20);
    let mut rng = StdRng::seed_from_u64(0);
    let mut data = rng.clone().random_iter().take(n_els).collect::<Vec<u64>>();

    let mut group = c.benchmark_group("Random items VS Itertools");
    compare_with_itertools(&mut group, &data);
    group.finish();

    data.clear();
    data.extend(0..(n_els as u64));
    // 1% of elements is out of order
    for _ in 0..(n_els / 200) {
        data.swap(rng.random_range(0..n_els), rng.random_range(0..n_els));
    }
    let mut group = c.benchmark_group("Partially ordered VS Itertools");
    compare_with_itertools(&mut group, &data);
    group.finish();

    data.clear();
    data.extend(0..(n_els as u64));
    let mut group = c.benchmark_group("Fully ordered VS Itertools");
    compare_with_itertools(&mut group, &data);
    group.finish();
}

fn bench_configs(c: &mut Criterion) {
    const N_ITERS: usize = 64;
    let n_els = 2_usize.pow(20);
    let mut data = StdRng::seed_from_u64(0)
        .random_iter()
        .take(n_els)
        .collect::<Vec<u64>>();
    data.sort_unstable();

    let mut group = c.benchmark_group(format!("Configs ({n_els} items; {N_ITERS} iters)"));
    group.bench_function("Ord", |b| {
        b.iter(|| Merged::new(runs(&data, N_ITERS)).build().into_vec());
    });
    group.bench_function("Reverse", |b| {
        b.iter(|| {
            Merged::new(runs(&data, N_ITERS).map(Iterator::rev))
                .reverse()
                .build()
                .into_vec()
        });
    });
    group.bench_function("By key", |b| {
        b.iter(|| {
            Merged::new(runs(&data, N_ITERS))
                .by_key(|x: &u64| x >> 8)
                .build()
                .into_vec()
        });
    });
    group.bench_function("Fallible comparator", |b| {
        b.iter(|| {
            Merged::new(runs(&data, N_ITERS))
                .try_by_func(|a: &u64, b: &u64| Ok::<_, std::fmt::Error>(a.cmp(b)))
                .build()
                .into_vec()
        });
    });
    group.finish();

    let cursors = || {
        runs(&data, N_ITERS)
            .map(|it| it.collect::<VecCursor<_>>())
            .collect::<Vec<_>>()
    };
    let mut group = c.benchmark_group(format!("Checkpoints ({n_els} items; {N_ITERS} iters)"));
    group.bench_function("Export halfway", |b| {
        b.iter_batched(
            || {
                let mut merged = Merged::new(cursors()).build();
                merged.by_ref().take(n_els / 2).for_each(drop);
                merged
            },
            |merged| merged.into_checkpoint().map_err(|(_, err)| err),
            criterion::BatchSize::LargeInput,
        );
    });
    group.bench_function("Resume halfway", |b| {
        let mut merged = Merged::new(cursors()).build();
        merged.by_ref().take(n_els / 2).for_each(drop);
        let checkpoint: Checkpoint<VecCursor<u64>, u64> =
            merged.into_checkpoint().map_err(|(_, err)| err).unwrap();
        b.iter_batched(
            || checkpoint.clone(),
            |checkpoint| Merged::resume(checkpoint).build().map(|it| it.into_vec()),
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_itertools, bench_configs);
