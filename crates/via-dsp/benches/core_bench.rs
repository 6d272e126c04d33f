//! Criterion benchmarks for via-dsp primitives
//!
//! Run with: cargo bench -p via-dsp
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use via_dsp::{
    BIG_SINE, DEFAULT_CYCLE_LEN, DEFAULT_PADDED_LEN, PhaseOscillator, WavetableFamily, fix16_mul,
    fold25, lerp15, pack_family,
};

const BLOCK_SIZES: &[usize] = &[8, 32, 128, 512];

fn sine_family() -> Vec<u32> {
    let cycles: Vec<Vec<i32>> = (0..9)
        .map(|table| {
            (0..DEFAULT_CYCLE_LEN)
                .map(|i| BIG_SINE[(i * 8 * (table + 1)) % 4096])
                .collect()
        })
        .collect();
    pack_family(&cycles).unwrap()
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Arithmetic");

    group.bench_function("fix16_mul", |b| {
        let mut acc = 0x1_0000;
        b.iter(|| {
            acc = fix16_mul(black_box(acc) | 1, black_box(0x1_0001));
            acc
        });
    });

    group.bench_function("lerp15", |b| {
        b.iter(|| lerp15(black_box(1200), black_box(31000), black_box(0x2345)));
    });

    group.bench_function("fold25", |b| {
        b.iter(|| fold25(black_box(0x0345_6789)));
    });

    group.finish();
}

fn bench_spline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spline");
    let data = sine_family();
    let family = WavetableFamily::new(&data, 9, DEFAULT_PADDED_LEN).unwrap();

    group.bench_function("evaluate", |b| {
        b.iter(|| family.evaluate(black_box(0x0123_4567), black_box(0x0003_8000)));
    });

    group.bench_function("evaluate_delta", |b| {
        b.iter(|| family.evaluate_delta(black_box(0x0123_4567), black_box(0x0003_8000), black_box(0x4000)));
    });

    group.finish();
}

fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("PhaseOscillator");
    let data = sine_family();
    let family = WavetableFamily::new(&data, 9, DEFAULT_PADDED_LEN).unwrap();

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(BenchmarkId::new("sine", block_size), &block_size, |b, &n| {
            let mut osc = PhaseOscillator::sine();
            osc.frequency = 0x0098_7654;
            b.iter(|| {
                for _ in 0..n {
                    black_box(osc.step());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("spline", block_size), &block_size, |b, &n| {
            let mut osc = PhaseOscillator::spline(family).unwrap();
            osc.frequency = 0x0098_7654;
            osc.morph = 0x0002_4000;
            b.iter(|| {
                for _ in 0..n {
                    osc.update_phase_modulation(black_box(1234));
                    black_box(osc.step());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_arithmetic, bench_spline, bench_oscillator);
criterion_main!(benches);
