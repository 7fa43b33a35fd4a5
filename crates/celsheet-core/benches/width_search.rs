use celsheet_core::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use rand::{Rng, SeedableRng};

fn generate_frames(count: usize, min_size: u32, max_size: u32) -> Vec<SizedFrame> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            // roughly one in five frames repeats an earlier pose
            if rng.gen_bool(0.2) {
                SizedFrame::with_content(32, 32, rng.gen_range(0..8))
            } else {
                SizedFrame::new(w, h)
            }
        })
        .collect()
}

fn bench_width_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("width_search");

    let strategies = [
        ("area", PackingSettings::builder().padding(1, 1).build()),
        (
            "ratio",
            PackingSettings::builder()
                .padding(1, 1)
                .favor_ratio(true)
                .build(),
        ),
        (
            "high_precision",
            PackingSettings::builder()
                .padding(1, 1)
                .high_precision(true)
                .build(),
        ),
        (
            "sorted",
            PackingSettings::builder()
                .padding(1, 1)
                .allow_unordered(true)
                .build(),
        ),
    ];

    for count in [50, 200, 500] {
        let frames = generate_frames(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        for (name, settings) in &strategies {
            group.bench_with_input(BenchmarkId::new(*name, count), &frames, |b, frames| {
                b.iter(|| black_box(pack(frames, settings)))
            });
        }
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_parallel_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("width_search_parallel");
    let frames = generate_frames(500, 16, 64);
    for parallel in [false, true] {
        let settings = PackingSettings::builder()
            .high_precision(true)
            .parallel(parallel)
            .build();
        group.bench_with_input(
            BenchmarkId::new("high_precision", if parallel { "rayon" } else { "sequential" }),
            &frames,
            |b, frames| b.iter(|| black_box(pack(frames, &settings))),
        );
    }
    group.finish();
}

#[cfg(not(feature = "parallel"))]
fn bench_parallel_search(_c: &mut Criterion) {}

criterion_group!(benches, bench_width_search, bench_parallel_search);
criterion_main!(benches);
