//! Benchmark for the reference GEMM routines across formats.
//!
//! Compares:
//! - f32 inputs (no conversion)
//! - f16 inputs, with and without the truncating bf16 path
//! - fp8 inputs widened to f32
//! - i8 inputs accumulated in f64

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use half::f16;
use mixgemm::float8::F8E4M3;
use mixgemm_ref::{gemm, GemmParams};

const SIZES: [usize; 3] = [64, 128, 256];

fn values(len: usize, offset: usize) -> Vec<f32> {
    (0..len).map(|i| (((i + offset) % 17) as f32 - 8.0) * 0.125).collect()
}

fn flops(n: usize) -> u64 {
    2 * (n * n * n) as u64
}

/// Benchmark wide inputs, where only the dense product runs
fn bench_f32(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reference_F32");
    group.sample_size(20);

    for &n in SIZES.iter() {
        let a = values(n * n, 0);
        let b = values(n * n, 5);
        let mut out = vec![0.0f32; n * n];
        let params = GemmParams::new(n, n, n);

        group.throughput(Throughput::Elements(flops(n)));
        group.bench_with_input(BenchmarkId::new("f32_f32", n), &n, |bench, _| {
            bench.iter(|| {
                gemm::<f32, f32, f32, f32>(&params, black_box(&a), black_box(&b), &mut out);
            });
        });
    }

    group.finish();
}

/// Benchmark 16-bit inputs, where widening and narrowing add to the product
fn bench_f16(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reference_F16");
    group.sample_size(20);

    for &n in SIZES.iter() {
        let a: Vec<f16> = values(n * n, 0).into_iter().map(f16::from_f32).collect();
        let b: Vec<f16> = values(n * n, 5).into_iter().map(f16::from_f32).collect();
        let mut out = vec![f16::from_f32(0.0); n * n];

        group.throughput(Throughput::Elements(flops(n)));

        for alt in [false, true] {
            let params = GemmParams::new(n, n, n).alt(alt);
            let name = if alt { "f16_alt" } else { "f16" };
            group.bench_with_input(BenchmarkId::new(name, n), &n, |bench, _| {
                bench.iter(|| {
                    gemm::<f16, f16, f16, f32>(&params, black_box(&a), black_box(&b), &mut out);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark 8-bit inputs
fn bench_8bit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reference_8bit");
    group.sample_size(20);

    for &n in SIZES.iter() {
        let a: Vec<F8E4M3> = values(n * n, 0).into_iter().map(F8E4M3::from_f32).collect();
        let b: Vec<F8E4M3> = values(n * n, 5).into_iter().map(F8E4M3::from_f32).collect();
        let mut out = vec![0.0f32; n * n];

        let ai: Vec<i8> = (0..n * n).map(|i| (i % 11) as i8 - 5).collect();
        let bi: Vec<i8> = (0..n * n).map(|i| (i % 7) as i8 - 3).collect();
        let mut out_i = vec![0i32; n * n];

        group.throughput(Throughput::Elements(flops(n)));

        let params = GemmParams::new(n, n, n);
        group.bench_with_input(BenchmarkId::new("e4m3_f32", n), &n, |bench, _| {
            bench.iter(|| {
                gemm::<F8E4M3, F8E4M3, f32, f32>(&params, black_box(&a), black_box(&b), &mut out);
            });
        });

        let params = GemmParams::new(n, n, n);
        group.bench_with_input(BenchmarkId::new("i8_i32", n), &n, |bench, _| {
            bench.iter(|| {
                gemm::<i8, i8, i32, i32>(&params, black_box(&ai), black_box(&bi), &mut out_i);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_f32, bench_f16, bench_8bit);
criterion_main!(benches);
