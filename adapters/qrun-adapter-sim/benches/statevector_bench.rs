//! Benchmarks for the statevector kernels and shot sampling
//!
//! Run with: cargo bench -p qrun-adapter-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use qrun_adapter_sim::{Statevector, run_simulation};
use qrun_ir::{Circuit, NoiseModel, StandardGate};

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("hadamard_layer");
    for n in [10usize, 16, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut sv = Statevector::new(n);
            b.iter(|| {
                for q in 0..n {
                    sv.apply_gate(black_box(&StandardGate::H), &[q]);
                }
            });
        });
    }
    group.finish();
}

fn bench_program_circuit(c: &mut Criterion) {
    let circuit = Circuit::superposition_entanglement().unwrap();
    let ideal = NoiseModel::ideal();
    let noisy = NoiseModel::superconducting();

    c.bench_function("program_4096_shots_ideal", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| run_simulation(black_box(&circuit), 4096, &ideal, &mut rng).unwrap());
    });
    c.bench_function("program_4096_shots_noisy", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| run_simulation(black_box(&circuit), 4096, &noisy, &mut rng).unwrap());
    });
}

criterion_group!(benches, bench_kernels, bench_program_circuit);
criterion_main!(benches);
