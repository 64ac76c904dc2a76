//! Performance benchmarks for fanhash
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fanhash::config::{EngineConfig, HashAlgorithm};
use fanhash::engine::FanOutEngine;
use fanhash::hash::{compute_bytes, parse_pipelines, Pipeline};
use std::io::Cursor;

fn test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn bench_hash_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_algorithms");

    let data_size = 10 * 1024 * 1024; // 10 MB
    let data = test_data(data_size);

    group.throughput(Throughput::Bytes(data_size as u64));

    for algo in HashAlgorithm::ALL {
        group.bench_with_input(BenchmarkId::new("hash", algo.name()), &data, |b, data| {
            b.iter(|| black_box(compute_bytes(algo, data)));
        });
    }

    group.finish();
}

fn bench_fan_out_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    let specs = ["c", "m", "s"];

    for size in [64 * 1024, 4 * 1024 * 1024, 32 * 1024 * 1024] {
        let data = test_data(size);
        let label = size.to_string();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("sequential", &label), &data, |b, data| {
            let pipelines: Vec<Pipeline> = specs.iter().map(|s| Pipeline::parse(s).unwrap()).collect();
            b.iter(|| {
                for pipeline in &pipelines {
                    let mut reader = Cursor::new(data.as_slice());
                    black_box(pipeline.apply_reader(&mut reader).unwrap());
                }
            });
        });

        for buffer_size in [1024, 64 * 1024] {
            let engine = FanOutEngine::new(EngineConfig::default().with_buffer_size(buffer_size));
            let pipelines = parse_pipelines(&specs, buffer_size).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("fan_out_{}", buffer_size), &label),
                &data,
                |b, data| {
                    b.iter(|| black_box(engine.run(Cursor::new(data.as_slice()), &pipelines).unwrap()));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_hash_algorithms, bench_fan_out_vs_sequential);

criterion_main!(benches);
