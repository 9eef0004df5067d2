//! Benchmarks for calibration matrix inversion and correction
//!
//! Run with: cargo bench -p tuneq-mitigation

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tuneq_adapter_sim::{ReadoutError, ReadoutSimulator};
use tuneq_hal::{Counts, Executor};
use tuneq_mitigation::{
    CalibrationMatrix, Corrector, MatrixInverter, MitigationConfig, build_calibration_circuits,
};

/// Calibration matrix measured on a uniformly noisy simulator.
fn calibration(num_qubits: usize) -> CalibrationMatrix {
    let sim = ReadoutSimulator::new(ReadoutError::new(0.03, 0.06).unwrap());
    let config = MitigationConfig::default().with_max_qubits(num_qubits);
    let circuits = build_calibration_circuits(num_qubits, num_qubits).unwrap();
    let results = sim.execute(&circuits, config.shots).unwrap();
    CalibrationMatrix::from_counts(&results, num_qubits, config.shots, &config).unwrap()
}

/// Benchmark exact inversion across register sizes
fn bench_inversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("inversion");

    for num_qubits in [2, 4, 6, 8] {
        let matrix = calibration(num_qubits);
        group.bench_with_input(
            BenchmarkId::new("exact", num_qubits),
            &matrix,
            |b, matrix| {
                let inverter = MatrixInverter::default();
                b.iter(|| inverter.invert(black_box(matrix)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark the pseudo-inverse path
fn bench_pseudo_inverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("pseudo_inverse");

    for num_qubits in [2, 4, 6, 8] {
        let matrix = calibration(num_qubits);
        // A threshold of 1 forces the SVD fallback for any noisy matrix.
        let inverter = MatrixInverter::new(1.0, 1e-10);
        group.bench_with_input(
            BenchmarkId::new("svd", num_qubits),
            &matrix,
            |b, matrix| {
                b.iter(|| inverter.invert(black_box(matrix)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark correcting a uniform raw distribution
fn bench_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("correction");

    for num_qubits in [2, 4, 6, 8] {
        let matrix = calibration(num_qubits);
        let inverse = MatrixInverter::default().invert(&matrix).unwrap();
        let raw: Counts = tuneq_mitigation::basis::bitstrings(num_qubits)
            .into_iter()
            .map(|b| (b, 10))
            .collect();

        group.bench_with_input(BenchmarkId::new("correct", num_qubits), &raw, |b, raw| {
            let corrector = Corrector::new(&inverse);
            b.iter(|| corrector.correct(black_box(raw)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_inversion,
    bench_pseudo_inverse,
    bench_correction,
);

criterion_main!(benches);
