//! Benchmarks for strand-compile: track compilation throughput and
//! shader source assembly.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strand_compile::shader::{SlotKind, TrackShader};
use strand_compile::{Compiler, DataSet, DataTable};
use strand_core::{ChannelId, Specification};

fn scatter_spec() -> Specification {
    Specification::from_json(
        r#"{
            "tracks": [{
                "mark": "point",
                "data": "cells",
                "x": { "attribute": "u", "domain": [0.0, 1000.0] },
                "y": { "attribute": "v", "domain": [0.0, 1000.0] },
                "color": { "value": "steelblue" },
                "size": { "attribute": "s", "domain": [0.0, 1.0] }
            }]
        }"#,
    )
    .expect("benchmark spec parses")
}

fn scatter_data(rows: usize) -> DataSet {
    let mut table = DataTable::new();
    let u: Vec<f64> = (0..rows).map(|i| (i as f64 * 7.3) % 1000.0).collect();
    let v: Vec<f64> = (0..rows).map(|i| (i as f64 * 13.7) % 1000.0).collect();
    let s: Vec<f64> = (0..rows).map(|i| (i as f64 * 0.17) % 1.0).collect();
    table.insert_numeric("u", u).unwrap();
    table.insert_numeric("v", v).unwrap();
    table.insert_numeric("s", s).unwrap();
    let mut data = DataSet::new();
    data.insert("cells", table);
    data
}

fn bench_compile_scatter(c: &mut Criterion) {
    let spec = scatter_spec();
    let compiler = Compiler::with_defaults();

    let mut group = c.benchmark_group("compile_scatter");
    for &rows in &[1_000, 10_000, 100_000] {
        let data = scatter_data(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| {
                black_box(compiler.compile(black_box(&spec), black_box(data)).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_shader_assembly(c: &mut Criterion) {
    c.bench_function("shader_assemble", |b| {
        b.iter(|| {
            let shader = TrackShader::new(vec![
                (ChannelId::Color, SlotKind::Attribute),
                (ChannelId::Size, SlotKind::Uniform),
                (ChannelId::Opacity, SlotKind::Uniform),
                (ChannelId::Shape, SlotKind::Uniform),
            ]);
            black_box(shader.source().len());
        });
    });
}

fn bench_shader_memoized_read(c: &mut Criterion) {
    let shader = TrackShader::new(vec![
        (ChannelId::Color, SlotKind::Uniform),
        (ChannelId::Size, SlotKind::Uniform),
    ]);
    shader.source(); // warm the cache
    c.bench_function("shader_memoized_read", |b| {
        b.iter(|| {
            black_box(shader.source().len());
        });
    });
}

criterion_group!(
    benches,
    bench_compile_scatter,
    bench_shader_assembly,
    bench_shader_memoized_read
);
criterion_main!(benches);
