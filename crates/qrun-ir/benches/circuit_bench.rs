//! Benchmarks for circuit construction and drawing
//!
//! Run with: cargo bench -p qrun-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qrun_ir::{Circuit, QubitId, draw};

fn bench_ghz_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghz_construction");
    for n in [3u32, 10, 24] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| Circuit::ghz(black_box(n)).unwrap());
        });
    }
    group.finish();
}

fn bench_depth(c: &mut Criterion) {
    let mut circuit = Circuit::with_size("layered", 16, 0);
    for layer in 0..50u32 {
        for q in 0..16u32 {
            circuit.h(QubitId(q)).unwrap();
        }
        let offset = layer % 2;
        for q in (offset..15).step_by(2) {
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
        }
    }
    c.bench_function("depth_16x50", |b| b.iter(|| black_box(&circuit).depth()));
}

fn bench_draw(c: &mut Criterion) {
    let circuit = Circuit::superposition_entanglement().unwrap();
    c.bench_function("draw_program_circuit", |b| b.iter(|| draw(black_box(&circuit))));
}

criterion_group!(benches, bench_ghz_construction, bench_depth, bench_draw);
criterion_main!(benches);
